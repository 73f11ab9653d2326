//! Deep merge functionality for configuration trees.
//!
//! Implements field-by-field merging where later trees override earlier ones.
//! Sequences and scalars are replaced entirely, not merged element-wise.

use crate::interpolate::interpolate;
use crate::logging::{EventKind, Logger};
use crate::tree::ConfigTree;
use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and nulls replace the base value
///
/// # Example
/// ```
/// use serde_json::json;
/// use profile_config::merge::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_trees(base_map, overlay_map))
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into `base` key by key.
///
/// Existing keys keep their position; new keys are appended.
pub fn merge_trees(mut base: ConfigTree, overlay: ConfigTree) -> ConfigTree {
    for (key, overlay_value) in overlay {
        match base.get_mut(&key) {
            Some(slot) => {
                let base_value = std::mem::take(slot);
                *slot = deep_merge(base_value, overlay_value);
            }
            None => {
                base.insert(key, overlay_value);
            }
        }
    }
    base
}

/// Merge multiple trees in order, with later trees taking precedence.
///
/// Equivalent to folding [`merge_trees`] over the list, starting empty.
pub fn deep_merge_all(trees: impl IntoIterator<Item = ConfigTree>) -> ConfigTree {
    trees.into_iter().fold(ConfigTree::new(), merge_trees)
}

/// Merges trees and optionally runs the interpolation pass.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    logger: Logger,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Merge `trees` left to right and, if requested, resolve `${path}`
    /// placeholders against the merged result.
    ///
    /// Interpolation failures never propagate: the merged tree is returned
    /// with placeholders left as written and a warning event is emitted.
    pub fn merge(&self, trees: impl IntoIterator<Item = ConfigTree>, interpolate: bool) -> ConfigTree {
        let mut sources = 0usize;
        let merged = trees
            .into_iter()
            .inspect(|_| sources += 1)
            .fold(ConfigTree::new(), merge_trees);

        self.logger.debug(
            EventKind::Merged { sources },
            format!("Merged {} configuration sources", sources),
        );

        if !interpolate {
            return merged;
        }
        self.interpolate_or_keep(merged)
    }

    fn interpolate_or_keep(&self, merged: ConfigTree) -> ConfigTree {
        match interpolate(&merged) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.logger.warning(
                    EventKind::InterpolationFailed {
                        reason: err.to_string(),
                    },
                    format!("Variable interpolation failed: {}", err),
                );
                merged
            }
        }
    }
}
