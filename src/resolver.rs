//! Resolution orchestrator.
//!
//! Resolution order:
//! 1. Discover configuration files (most specific first)
//! 2. Load them least specific first, skipping files that fail to parse
//! 3. Merge the loaded files without interpolation
//! 4. Resolve the requested profile against the merged document
//! 5. Apply overrides in order and interpolate once at the end
//!
//! Nothing is cached between calls: every `resolve()` re-reads the disk.

use crate::discovery::{ConfigDiscovery, Discover};
use crate::error::{ProfileConfigError, Result};
use crate::loader::{FileLoader, Load};
use crate::logging::{EventKind, EventLevel, EventSink, Logger};
use crate::merge::ConfigMerger;
use crate::options::{Override, ResolverOptions};
use crate::profiles::ProfileResolver;
use crate::tree::{ConfigDocument, ConfigTree};
use std::path::PathBuf;
use std::sync::Arc;

/// Main entry point for profile-based configuration resolution.
///
/// # Example
/// ```no_run
/// use profile_config::ProfileConfigResolver;
///
/// let config = ProfileConfigResolver::new("myapp")
///     .with_profile("dev")
///     .with_search_home(false)
///     .resolve()?;
/// println!("{}", serde_json::Value::Object(config));
/// # Ok::<(), profile_config::ProfileConfigError>(())
/// ```
#[derive(Clone)]
pub struct ProfileConfigResolver {
    config_name: String,
    profile: String,
    enable_interpolation: bool,
    overrides: Vec<Override>,
    discovery: ConfigDiscovery,
    custom_discovery: Option<Arc<dyn Discover>>,
    loader: Arc<dyn Load>,
    profile_resolver: ProfileResolver,
    logger: Logger,
}

impl ProfileConfigResolver {
    /// Create a resolver with default options for `config_name`.
    pub fn new(config_name: impl Into<String>) -> Self {
        Self::from_options(ResolverOptions::new(config_name))
    }

    /// Create a resolver from a full set of options.
    pub fn from_options(options: ResolverOptions) -> Self {
        let discovery = ConfigDiscovery::new(options.config_name.clone())
            .with_profile_filename(options.profile_filename)
            .with_extensions(options.extensions)
            .with_search_home(options.search_home);

        Self {
            config_name: options.config_name,
            profile: options.profile,
            enable_interpolation: options.enable_interpolation,
            overrides: options.overrides,
            discovery,
            custom_discovery: None,
            loader: Arc::new(FileLoader::new()),
            profile_resolver: ProfileResolver::new(options.inherit_key),
            logger: Logger::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_profile_filename(mut self, filename: impl Into<String>) -> Self {
        self.discovery = self.discovery.with_profile_filename(filename);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discovery = self.discovery.with_extensions(extensions);
        self
    }

    pub fn with_search_home(mut self, search_home: bool) -> Self {
        self.discovery = self.discovery.with_search_home(search_home);
        self
    }

    /// Start discovery from `dir` instead of the current directory.
    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.discovery = self.discovery.with_start_dir(dir);
        self
    }

    /// Use `dir` as the home directory for discovery.
    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.discovery = self.discovery.with_home_dir(dir);
        self
    }

    pub fn with_inherit_key(mut self, key: impl Into<String>) -> Self {
        self.profile_resolver = ProfileResolver::new(key);
        self
    }

    pub fn with_interpolation(mut self, enabled: bool) -> Self {
        self.enable_interpolation = enabled;
        self
    }

    /// Append one override. Later overrides win.
    pub fn with_override(mut self, source: impl Into<Override>) -> Self {
        self.overrides.push(source.into());
        self
    }

    /// Replace all overrides.
    pub fn with_overrides<I, O>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Override>,
    {
        self.overrides = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the discovery collaborator.
    pub fn with_discovery(mut self, discovery: Arc<dyn Discover>) -> Self {
        self.custom_discovery = Some(discovery);
        self
    }

    /// Replace the load collaborator.
    pub fn with_loader(mut self, loader: Arc<dyn Load>) -> Self {
        self.loader = loader;
        self
    }

    /// Deliver resolution events to `sink`.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.logger = self.logger.with_sink(sink);
        self
    }

    /// Only deliver events at or above `level` to the sink.
    pub fn with_min_event_level(mut self, level: EventLevel) -> Self {
        self.logger = self.logger.with_min_level(level);
        self
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn interpolation_enabled(&self) -> bool {
        self.enable_interpolation
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    fn discover(&self) -> Result<Vec<PathBuf>> {
        match self.custom_discovery {
            Some(ref discovery) => discovery.discover(),
            None => self.discovery.discover(),
        }
    }

    fn merger(&self) -> ConfigMerger {
        ConfigMerger::new().with_logger(self.logger.clone())
    }

    /// Resolve the effective configuration.
    ///
    /// # Errors
    /// - `ConfigNotFound` if no configuration file could be loaded
    /// - `ProfileNotFound`/`InheritedProfileNotFound` for missing profiles
    /// - `CircularInheritance` for inheritance cycles
    /// - `OverrideLoad` if an override file cannot be loaded
    pub fn resolve(&self) -> Result<ConfigTree> {
        let merged = self.load_merged()?;
        let document = ConfigDocument::new(&merged);

        let profile_resolver = self.profile_resolver.clone().with_logger(self.logger.clone());
        let default_profile = profile_resolver.default_profile(&document);
        let profile_config = profile_resolver.resolve_profile(&document, &self.profile, default_profile)?;

        let mut layers = Vec::with_capacity(self.overrides.len() + 1);
        layers.push(profile_config);
        layers.extend(self.load_overrides()?);

        let final_config = self.merger().merge(layers, self.enable_interpolation);

        self.logger.info(
            EventKind::Resolved {
                profile: self.profile.clone(),
                keys: final_config.len(),
            },
            format!(
                "Resolved configuration for profile '{}' with {} keys",
                self.profile,
                final_config.len()
            ),
        );
        Ok(final_config)
    }

    /// Profile names from the merged configuration, in document order.
    ///
    /// Never fails: anything that would prevent loading yields an empty list.
    pub fn list_profiles(&self) -> Vec<String> {
        match self.load_merged() {
            Ok(merged) => self.profile_resolver.list_profiles(&ConfigDocument::new(&merged)),
            Err(_) => Vec::new(),
        }
    }

    /// Discovered configuration files, most specific first.
    ///
    /// Returns an empty list when nothing is found.
    pub fn get_config_files(&self) -> Vec<PathBuf> {
        self.discover().unwrap_or_default()
    }

    /// Discover, load and merge every configuration file, without
    /// interpolation.
    fn load_merged(&self) -> Result<ConfigTree> {
        let files = self.discover()?;
        self.logger.info(
            EventKind::FilesDiscovered { count: files.len() },
            format!("Found {} configuration files", files.len()),
        );

        // Discovery is most specific first; merge wants least specific first.
        let mut documents = Vec::with_capacity(files.len());
        for path in files.iter().rev() {
            match self.loader.load(path) {
                Ok(tree) => {
                    self.logger.debug(
                        EventKind::FileLoaded { path: path.clone() },
                        format!("Loaded config from {}", path.display()),
                    );
                    documents.push(tree);
                }
                Err(err) => {
                    self.logger.warning(
                        EventKind::FileSkipped {
                            path: path.clone(),
                            reason: err.to_string(),
                        },
                        format!("Failed to load config from {}: {}", path.display(), err),
                    );
                }
            }
        }

        if documents.is_empty() {
            return Err(ProfileConfigError::ConfigNotFound {
                config_name: self.config_name.clone(),
                searched: files,
            });
        }

        Ok(self.merger().merge(documents, false))
    }

    fn load_overrides(&self) -> Result<Vec<ConfigTree>> {
        self.overrides
            .iter()
            .map(|source| match source {
                Override::Tree(tree) => Ok(tree.clone()),
                Override::File(path) => {
                    let tree = self
                        .loader
                        .load(path)
                        .map_err(|source| ProfileConfigError::OverrideLoad {
                            path: path.clone(),
                            source,
                        })?;
                    self.logger.debug(
                        EventKind::OverrideLoaded { path: path.clone() },
                        format!("Loaded override from {}", path.display()),
                    );
                    Ok(tree)
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for ProfileConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileConfigResolver")
            .field("config_name", &self.config_name)
            .field("profile", &self.profile)
            .field("enable_interpolation", &self.enable_interpolation)
            .field("overrides", &self.overrides.len())
            .field("discovery", &self.discovery)
            .field("custom_discovery", &self.custom_discovery.is_some())
            .field("inherit_key", &self.profile_resolver.inherit_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::logging::CollectingSink;
    use crate::tree::into_tree;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// Fixed list of locations.
    struct StaticDiscovery(Vec<PathBuf>);

    impl Discover for StaticDiscovery {
        fn discover(&self) -> Result<Vec<PathBuf>> {
            if self.0.is_empty() {
                return Err(ProfileConfigError::ConfigNotFound {
                    config_name: "memory".into(),
                    searched: Vec::new(),
                });
            }
            Ok(self.0.clone())
        }
    }

    /// In-memory file system; missing entries fail to parse.
    #[derive(Default)]
    struct MemoryLoader {
        files: HashMap<PathBuf, Value>,
        loads: Mutex<Vec<PathBuf>>,
    }

    impl MemoryLoader {
        fn with(mut self, path: &str, value: Value) -> Self {
            self.files.insert(PathBuf::from(path), value);
            self
        }

        fn loads(&self) -> Vec<PathBuf> {
            self.loads.lock().unwrap().clone()
        }
    }

    impl Load for MemoryLoader {
        fn load(&self, path: &Path) -> std::result::Result<ConfigTree, LoadError> {
            self.loads.lock().unwrap().push(path.to_path_buf());
            self.files
                .get(path)
                .cloned()
                .and_then(into_tree)
                .ok_or_else(|| LoadError::NotAMapping {
                    path: path.to_path_buf(),
                    found: "null",
                })
        }
    }

    fn resolver(files: &[&str], loader: Arc<MemoryLoader>) -> ProfileConfigResolver {
        ProfileConfigResolver::new("memory")
            .with_discovery(Arc::new(StaticDiscovery(
                files.iter().map(PathBuf::from).collect(),
            )))
            .with_loader(loader)
    }

    #[test]
    fn test_most_specific_file_wins() {
        let loader = Arc::new(
            MemoryLoader::default()
                .with("/work/app/config.yaml", json!({"defaults": {"level": "work", "a": 1}}))
                .with("/app/config.yaml", json!({"defaults": {"level": "root", "b": 2}})),
        );
        let config = resolver(&["/work/app/config.yaml", "/app/config.yaml"], loader.clone())
            .resolve()
            .unwrap();

        assert_eq!(
            Value::Object(config),
            json!({"level": "work", "a": 1, "b": 2})
        );
        // Parsed least specific first.
        assert_eq!(
            loader.loads(),
            vec![
                PathBuf::from("/app/config.yaml"),
                PathBuf::from("/work/app/config.yaml")
            ]
        );
    }

    #[test]
    fn test_broken_file_skipped_with_warning() {
        let sink = Arc::new(CollectingSink::new());
        let loader = Arc::new(MemoryLoader::default().with("/good.yaml", json!({"x": 1})));
        let config = resolver(&["/broken.yaml", "/good.yaml"], loader)
            .with_event_sink(sink.clone())
            .resolve()
            .unwrap();

        assert_eq!(config["x"], json!(1));
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0].kind,
            EventKind::FileSkipped { ref path, .. } if path == Path::new("/broken.yaml")
        ));
    }

    #[test]
    fn test_min_event_level_limits_sink() {
        let sink = Arc::new(CollectingSink::new());
        let loader = Arc::new(MemoryLoader::default().with("/good.yaml", json!({"x": 1})));
        resolver(&["/good.yaml"], loader)
            .with_event_sink(sink.clone())
            .with_min_event_level(EventLevel::Warning)
            .resolve()
            .unwrap();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_all_files_broken_is_config_not_found() {
        let loader = Arc::new(MemoryLoader::default());
        let err = resolver(&["/a.yaml", "/b.yaml"], loader).resolve().unwrap_err();
        match err {
            ProfileConfigError::ConfigNotFound { searched, .. } => assert_eq!(searched.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overrides_applied_in_order() {
        let loader = Arc::new(MemoryLoader::default().with(
            "/c.yaml",
            json!({"profiles": {"default": {"x": 0, "z": 9}}}),
        ));
        let config = resolver(&["/c.yaml"], loader)
            .with_override(into_tree(json!({"x": 1})).unwrap())
            .with_override(into_tree(json!({"x": 2, "y": 3})).unwrap())
            .resolve()
            .unwrap();
        assert_eq!(Value::Object(config), json!({"x": 2, "y": 3, "z": 9}));
    }

    #[test]
    fn test_override_file_loaded_through_loader() {
        let loader = Arc::new(
            MemoryLoader::default()
                .with("/c.yaml", json!({"defaults": {"port": 1}}))
                .with("/override.yaml", json!({"port": 2})),
        );
        let config = resolver(&["/c.yaml"], loader)
            .with_override("/override.yaml")
            .resolve()
            .unwrap();
        assert_eq!(config["port"], json!(2));
    }

    #[test]
    fn test_override_load_error() {
        let loader = Arc::new(MemoryLoader::default().with("/c.yaml", json!({})));
        let err = resolver(&["/c.yaml"], loader)
            .with_override("/missing.yaml")
            .resolve()
            .unwrap_err();
        match err {
            ProfileConfigError::OverrideLoad { path, .. } => {
                assert_eq!(path, PathBuf::from("/missing.yaml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interpolation_sees_profile_and_override_keys() {
        let loader = Arc::new(MemoryLoader::default().with(
            "/c.yaml",
            json!({
                "defaults": {"data_path": "${base_path}/data"},
                "profiles": {"dev": {"base_path": "/app"}}
            }),
        ));
        let config = resolver(&["/c.yaml"], loader)
            .with_profile("dev")
            .with_override(into_tree(json!({"base_path": "/override"})).unwrap())
            .resolve()
            .unwrap();
        assert_eq!(config["data_path"], json!("/override/data"));
    }

    #[test]
    fn test_interpolation_disabled() {
        let loader = Arc::new(MemoryLoader::default().with(
            "/c.yaml",
            json!({"defaults": {"a": "x", "b": "${a}"}}),
        ));
        let config = resolver(&["/c.yaml"], loader)
            .with_interpolation(false)
            .resolve()
            .unwrap();
        assert_eq!(config["b"], json!("${a}"));
    }

    #[test]
    fn test_resolve_is_repeatable_and_rereads() {
        let loader = Arc::new(MemoryLoader::default().with("/c.yaml", json!({"k": 1})));
        let r = resolver(&["/c.yaml"], loader.clone());
        assert_eq!(r.resolve().unwrap(), r.resolve().unwrap());
        assert_eq!(loader.loads().len(), 2);
    }

    #[test]
    fn test_list_profiles_and_files_never_fail() {
        let loader = Arc::new(MemoryLoader::default());
        let r = resolver(&[], loader);
        assert!(r.list_profiles().is_empty());
        assert!(r.get_config_files().is_empty());
    }

    #[test]
    fn test_list_profiles_merges_all_files() {
        let loader = Arc::new(
            MemoryLoader::default()
                .with("/near.yaml", json!({"profiles": {"dev": {}, "local": {}}}))
                .with("/far.yaml", json!({"profiles": {"prod": {}, "dev": {}}})),
        );
        let r = resolver(&["/near.yaml", "/far.yaml"], loader);
        assert_eq!(r.list_profiles(), vec!["prod", "dev", "local"]);
        assert_eq!(
            r.get_config_files(),
            vec![PathBuf::from("/near.yaml"), PathBuf::from("/far.yaml")]
        );
    }

    #[test]
    fn test_from_options() {
        let mut options = ResolverOptions::new("myapp");
        options.profile = "prod".into();
        options.inherit_key = "extends".into();
        options.enable_interpolation = false;
        let r = ProfileConfigResolver::from_options(options);
        assert_eq!(r.config_name(), "myapp");
        assert_eq!(r.profile(), "prod");
        assert!(!r.interpolation_enabled());
    }

    #[test]
    fn test_resolver_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProfileConfigResolver>();
    }
}
