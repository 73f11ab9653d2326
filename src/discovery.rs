//! Configuration file discovery with hierarchical search.
//!
//! Looks for `{config_name}/{profile_filename}.{ext}` in the start
//! directory and each of its ancestors, then optionally in the user's home
//! directory. Results are ordered most specific first.

use crate::error::{ProfileConfigError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extensions searched when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

/// Base filename searched when none is configured.
pub const DEFAULT_PROFILE_FILENAME: &str = "config";

/// Produces candidate configuration files, most specific first.
pub trait Discover: Send + Sync {
    /// Fails with [`ProfileConfigError::ConfigNotFound`] when nothing exists.
    fn discover(&self) -> Result<Vec<PathBuf>>;
}

/// Filesystem discovery walking from a start directory up to the root.
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    config_name: String,
    profile_filename: String,
    extensions: Vec<String>,
    search_home: bool,
    /// Directory to start from. `None` means the current working directory.
    start_dir: Option<PathBuf>,
    /// Home directory override. `None` means `dirs::home_dir()`.
    home_dir: Option<PathBuf>,
}

impl ConfigDiscovery {
    pub fn new(config_name: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            profile_filename: DEFAULT_PROFILE_FILENAME.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            search_home: true,
            start_dir: None,
            home_dir: None,
        }
    }

    pub fn with_profile_filename(mut self, filename: impl Into<String>) -> Self {
        self.profile_filename = filename.into();
        self
    }

    /// Extensions without the leading dot, searched in order.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn with_search_home(mut self, search_home: bool) -> Self {
        self.search_home = search_home;
        self
    }

    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(dir.into());
        self
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(dir.into());
        self
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn profile_filename(&self) -> &str {
        &self.profile_filename
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn search_home(&self) -> bool {
        self.search_home
    }

    fn start(&self) -> Option<PathBuf> {
        self.start_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }

    fn home(&self) -> Option<PathBuf> {
        self.home_dir.clone().or_else(dirs::home_dir)
    }

    /// Config directories that are searched, in search order.
    pub fn search_locations(&self) -> Vec<PathBuf> {
        let mut locations: Vec<PathBuf> = self
            .start()
            .map(|start| {
                start
                    .ancestors()
                    .map(|dir| dir.join(&self.config_name))
                    .collect()
            })
            .unwrap_or_default();

        if self.search_home
            && let Some(home) = self.home()
        {
            locations.push(home.join(&self.config_name));
        }
        locations
    }

    /// Candidate files in one config directory, in extension order.
    fn search_directory(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.is_dir() {
            return Vec::new();
        }
        self.extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", self.profile_filename, ext)))
            .filter(|path| path.is_file())
            .collect()
    }
}

impl Discover for ConfigDiscovery {
    fn discover(&self) -> Result<Vec<PathBuf>> {
        let searched = self.search_locations();

        let mut files = Vec::new();
        if !self.config_name.is_empty() && !self.profile_filename.is_empty() {
            for dir in &searched {
                files.extend(self.search_directory(dir));
            }
        }

        let files = remove_duplicates(files);
        if files.is_empty() {
            return Err(ProfileConfigError::ConfigNotFound {
                config_name: self.config_name.clone(),
                searched,
            });
        }
        Ok(files)
    }
}

/// Drop paths that resolve to a file already seen, keeping the first.
fn remove_duplicates(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|path| {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            seen.insert(canonical)
        })
        .collect()
}
