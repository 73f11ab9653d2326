//! Configuration file loading.
//!
//! The format is chosen from the file extension: `.yaml`/`.yml`, `.json`
//! or `.toml`. Every format must produce a mapping at the top level.

use crate::error::LoadError;
use crate::tree::{ConfigTree, type_name};
use serde_json::Value;
use std::path::Path;

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Yaml => write!(f, "yaml"),
            ConfigFormat::Json => write!(f, "json"),
            ConfigFormat::Toml => write!(f, "toml"),
        }
    }
}

/// Turns a file location into a configuration tree.
///
/// Implementations must be reentrant; the resolver may call them from
/// several threads at once.
pub trait Load: Send + Sync {
    fn load(&self, path: &Path) -> Result<ConfigTree, LoadError>;
}

/// Loads YAML, JSON and TOML files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse `content` as `format`. `path` is only used for error messages.
    pub fn parse(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> Result<ConfigTree, LoadError> {
        let value = match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str::<Value>(content).map_err(|source| LoadError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            ConfigFormat::Json => {
                serde_json::from_str::<Value>(content).map_err(|source| LoadError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            ConfigFormat::Toml => {
                let table = toml::from_str::<toml::Table>(content).map_err(|source| {
                    LoadError::Toml {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                toml_to_json(toml::Value::Table(table))
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            // Empty YAML documents parse as null.
            Value::Null if format == ConfigFormat::Yaml => Ok(ConfigTree::new()),
            other => Err(LoadError::NotAMapping {
                path: path.to_path_buf(),
                found: type_name(&other),
            }),
        }
    }
}

impl Load for FileLoader {
    fn load(&self, path: &Path) -> Result<ConfigTree, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.parse(&content, format, path)
    }
}

/// TOML datetimes have no JSON counterpart and become strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
