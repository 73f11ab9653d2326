//! Error types for configuration resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the resolver.
#[derive(Debug, Error)]
pub enum ProfileConfigError {
    /// No configuration file could be discovered or parsed.
    #[error("no configuration files found for '{config_name}' (searched: {})", display_paths(.searched))]
    ConfigNotFound {
        config_name: String,
        searched: Vec<PathBuf>,
    },

    /// The requested profile does not exist and no fallback applies.
    #[error("profile '{profile}' not found. Available profiles: [{}]", .available.join(", "))]
    ProfileNotFound {
        profile: String,
        available: Vec<String>,
    },

    /// A profile inherits from a parent that does not exist.
    #[error(
        "profile '{profile}' not found in inheritance chain (inherited by '{inherited_by}'). Available profiles: [{}]",
        .available.join(", ")
    )]
    InheritedProfileNotFound {
        profile: String,
        inherited_by: String,
        available: Vec<String>,
    },

    /// The inheritance graph loops back on itself.
    #[error("circular inheritance detected: {}", .chain.join(" -> "))]
    CircularInheritance { chain: Vec<String> },

    /// An override file could not be read or parsed.
    #[error("failed to load override file {}: {source}", .path.display())]
    OverrideLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// A reserved section has the wrong shape.
    #[error("invalid configuration at '{key}': {reason}")]
    InvalidDocument { key: String, reason: String },
}

impl ProfileConfigError {
    /// True for both the top-level and the chain-internal not-found variants.
    pub fn is_profile_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound { .. } | Self::InheritedProfileNotFound { .. }
        )
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Failures of the file load collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} must contain a mapping at the top level, got {found}", .path.display())]
    NotAMapping { path: PathBuf, found: &'static str },

    #[error(
        "unsupported file format '{extension}' for {}. Supported formats: .yaml, .yml, .json, .toml",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf, extension: String },
}

impl LoadError {
    /// The file the failure refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path }
            | Self::Io { path, .. }
            | Self::Yaml { path, .. }
            | Self::Json { path, .. }
            | Self::Toml { path, .. }
            | Self::NotAMapping { path, .. }
            | Self::UnsupportedFormat { path, .. } => path,
        }
    }
}

/// Interpolation failures. Caught inside the merger and reported as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
    #[error("interpolation key '{key}' not found")]
    UnknownKey { key: String },

    #[error("interpolation cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("invalid placeholder '${{{placeholder}}}'")]
    InvalidPlaceholder { placeholder: String },
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ProfileConfigError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
