//! Configuration tree model.
//!
//! A [`ConfigTree`] is an insertion-ordered JSON object. A [`ConfigDocument`]
//! is a read-only view over a merged tree that knows about the reserved
//! top-level sections (`defaults`, `profiles`, `default_profile`).

use crate::error::{ProfileConfigError, Result};
use serde_json::{Map, Value};

/// Recursively nested key/value mapping.
pub type ConfigTree = Map<String, Value>;

/// Baseline values shared by every profile.
pub const DEFAULTS_KEY: &str = "defaults";
/// Mapping from profile name to profile tree.
pub const PROFILES_KEY: &str = "profiles";
/// Name of the fallback profile.
pub const DEFAULT_PROFILE_KEY: &str = "default_profile";
/// Inheritance key used when none is configured.
pub const DEFAULT_INHERIT_KEY: &str = "inherits";
/// Fallback profile name when the document does not set one.
pub const DEFAULT_PROFILE_NAME: &str = "default";

const RESERVED_KEYS: [&str; 3] = [DEFAULTS_KEY, PROFILES_KEY, DEFAULT_PROFILE_KEY];

/// Returns true if `key` is one of the reserved top-level sections.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Read-only view of a configuration document.
#[derive(Debug, Clone, Copy)]
pub struct ConfigDocument<'a> {
    tree: &'a ConfigTree,
}

impl<'a> ConfigDocument<'a> {
    pub fn new(tree: &'a ConfigTree) -> Self {
        Self { tree }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &'a ConfigTree {
        self.tree
    }

    /// The `defaults` section, if present. `null` counts as absent.
    pub fn defaults(&self) -> Result<Option<&'a ConfigTree>> {
        section(self.tree, DEFAULTS_KEY)
    }

    /// The `profiles` section, if present. `null` counts as absent.
    pub fn profiles(&self) -> Result<Option<&'a ConfigTree>> {
        section(self.tree, PROFILES_KEY)
    }

    /// The `default_profile` name, or `"default"`.
    pub fn default_profile(&self) -> &'a str {
        self.tree
            .get(DEFAULT_PROFILE_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROFILE_NAME)
    }

    /// Top-level keys that are not reserved sections, in document order.
    pub fn root_values(&self) -> impl Iterator<Item = (&'a String, &'a Value)> {
        self.tree.iter().filter(|(key, _)| !is_reserved_key(key))
    }
}

fn section<'a>(tree: &'a ConfigTree, key: &str) -> Result<Option<&'a ConfigTree>> {
    match tree.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ProfileConfigError::invalid(
            key,
            format!("expected a mapping, got {}", type_name(other)),
        )),
    }
}

/// Look up a dot-separated path such as `database.host` or `servers.0.name`.
///
/// Numeric segments index into sequences.
pub fn lookup<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    lookup_segments(tree, &segments)
}

/// Like [`lookup`], with the path already split into segments.
pub fn lookup_segments<'a, S: AsRef<str>>(tree: &'a ConfigTree, segments: &[S]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let mut current = tree.get(first.as_ref())?;
    for segment in rest {
        let segment = segment.as_ref();
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Short name of a value's kind, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Convert a JSON value into a tree, if it is an object.
pub fn into_tree(value: Value) -> Option<ConfigTree> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigTree {
        into_tree(value).unwrap()
    }

    #[test]
    fn test_lookup_nested_and_indexed() {
        let t = tree(json!({
            "database": {"host": "db", "port": 5432},
            "servers": [{"name": "a"}, {"name": "b"}]
        }));
        assert_eq!(lookup(&t, "database.host"), Some(&json!("db")));
        assert_eq!(lookup(&t, "servers.1.name"), Some(&json!("b")));
        assert_eq!(lookup(&t, "servers.9.name"), None);
        assert_eq!(lookup(&t, "database.host.extra"), None);
        assert_eq!(lookup(&t, "missing"), None);
    }

    #[test]
    fn test_lookup_segments_reaches_dotted_keys() {
        let t = tree(json!({"a.b": 1, "a": {"b": 2}}));
        assert_eq!(lookup_segments(&t, &["a.b"]), Some(&json!(1)));
        assert_eq!(lookup_segments(&t, &["a", "b"]), Some(&json!(2)));
        assert_eq!(lookup(&t, "a.b"), Some(&json!(2)));
        assert_eq!(lookup_segments::<&str>(&t, &[]), None);
    }

    #[test]
    fn test_document_sections() {
        let t = tree(json!({
            "defaults": {"timeout": 30},
            "profiles": null,
            "default_profile": "dev",
            "name": "app"
        }));
        let doc = ConfigDocument::new(&t);
        assert_eq!(doc.defaults().unwrap().unwrap().len(), 1);
        assert!(doc.profiles().unwrap().is_none());
        assert_eq!(doc.default_profile(), "dev");
        let roots: Vec<_> = doc.root_values().map(|(k, _)| k.as_str()).collect();
        assert_eq!(roots, vec!["name"]);
    }

    #[test]
    fn test_default_profile_fallback() {
        let t = ConfigTree::new();
        assert_eq!(ConfigDocument::new(&t).default_profile(), "default");
    }

    #[test]
    fn test_non_mapping_section_is_invalid() {
        let t = tree(json!({"profiles": ["dev"]}));
        let err = ConfigDocument::new(&t).profiles().unwrap_err();
        assert!(matches!(err, ProfileConfigError::InvalidDocument { ref key, .. } if key == "profiles"));
    }
}
