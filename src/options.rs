//! Resolver options.
//!
//! Options can be built in code or deserialized from any serde format, so a
//! host application can keep its resolver settings alongside its own config.

use crate::discovery::{DEFAULT_EXTENSIONS, DEFAULT_PROFILE_FILENAME};
use crate::tree::{ConfigTree, DEFAULT_INHERIT_KEY, DEFAULT_PROFILE_NAME};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A source of override values, applied after profile resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Override {
    /// Literal values.
    Tree(ConfigTree),
    /// A YAML, JSON or TOML file loaded at resolve time.
    File(PathBuf),
}

impl Override {
    /// Build a literal override from a JSON value. Non-object values yield
    /// `None`.
    pub fn tree(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Tree(map)),
            _ => None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

impl From<ConfigTree> for Override {
    fn from(tree: ConfigTree) -> Self {
        Self::Tree(tree)
    }
}

impl From<PathBuf> for Override {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for Override {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<&str> for Override {
    fn from(path: &str) -> Self {
        Self::File(PathBuf::from(path))
    }
}

/// Constructor options for [`crate::ProfileConfigResolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Directory name searched for during discovery (e.g. `myapp`).
    pub config_name: String,
    /// Profile to resolve.
    pub profile: String,
    /// Base filename without extension.
    pub profile_filename: String,
    /// Extensions searched, in order.
    pub extensions: Vec<String>,
    /// Whether discovery includes the home directory.
    pub search_home: bool,
    /// Key naming a profile's parent.
    pub inherit_key: String,
    /// Whether `${path}` placeholders are resolved.
    pub enable_interpolation: bool,
    /// Overrides applied in order, later entries winning.
    pub overrides: Vec<Override>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            config_name: String::new(),
            profile: DEFAULT_PROFILE_NAME.to_string(),
            profile_filename: DEFAULT_PROFILE_FILENAME.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            search_home: true,
            inherit_key: DEFAULT_INHERIT_KEY.to_string(),
            enable_interpolation: true,
            overrides: Vec::new(),
        }
    }
}

impl ResolverOptions {
    pub fn new(config_name: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = ResolverOptions::new("myapp");
        assert_eq!(options.config_name, "myapp");
        assert_eq!(options.profile, "default");
        assert_eq!(options.profile_filename, "config");
        assert_eq!(options.extensions, vec!["yaml", "yml", "json", "toml"]);
        assert!(options.search_home);
        assert_eq!(options.inherit_key, "inherits");
        assert!(options.enable_interpolation);
        assert!(options.overrides.is_empty());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let options: ResolverOptions = serde_yaml::from_str(
            r#"
config_name: myapp
profile: prod
search_home: false
overrides:
  - debug: false
  - /etc/myapp/local.yaml
"#,
        )
        .unwrap();

        assert_eq!(options.profile, "prod");
        assert!(!options.search_home);
        assert_eq!(options.profile_filename, "config");
        assert_eq!(
            options.overrides,
            vec![
                Override::tree(json!({"debug": false})).unwrap(),
                Override::file("/etc/myapp/local.yaml"),
            ]
        );
    }

    #[test]
    fn test_override_conversions() {
        assert_eq!(Override::from("a.yaml"), Override::File(PathBuf::from("a.yaml")));
        assert!(Override::tree(json!([1, 2])).is_none());
        let tree = ConfigTree::new();
        assert_eq!(Override::from(tree.clone()), Override::Tree(tree));
    }
}
