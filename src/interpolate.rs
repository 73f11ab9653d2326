//! `${path}` placeholder expansion.
//!
//! Placeholders reference other keys of the same tree by dotted path
//! (`${database.host}`, `${servers.0.name}`). References are followed
//! transitively until every reachable chain is expanded. A string made of a
//! single placeholder takes the referenced value as-is, so `${port}` stays a
//! number; placeholders embedded in text are replaced by the value's string
//! form. `\${...}` produces a literal `${...}`.

use crate::error::InterpolationError;
use crate::tree::{ConfigTree, lookup_segments};
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\\)?\$\{([^{}]*)\}").expect("placeholder pattern is valid"));

/// Returns true if `text` contains at least one placeholder or escape.
pub fn has_placeholders(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Resolve every placeholder in `tree`.
///
/// Fails on unknown keys, malformed paths, and reference cycles. The input
/// is never modified.
pub fn interpolate(tree: &ConfigTree) -> Result<ConfigTree, InterpolationError> {
    let mut interpolator = Interpolator::new(tree);
    let mut out = Map::with_capacity(tree.len());
    for (key, value) in tree {
        out.insert(key.clone(), interpolator.resolve_value(&[key.clone()], value)?);
    }
    Ok(out)
}

/// Location of a value as its key segments. Keys may themselves contain
/// dots, so paths are never compared in joined form.
type KeyPath = Vec<String>;

struct Interpolator<'a> {
    root: &'a ConfigTree,
    /// Fully expanded strings, keyed by location.
    resolved: HashMap<KeyPath, Value>,
    /// Locations currently being expanded, outermost first.
    in_progress: Vec<KeyPath>,
}

impl<'a> Interpolator<'a> {
    fn new(root: &'a ConfigTree) -> Self {
        Self {
            root,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn resolve_value(&mut self, path: &[String], value: &Value) -> Result<Value, InterpolationError> {
        match value {
            Value::String(text) => self.resolve_string(path, text),
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let child_path = child_path(path, key.clone());
                    out.insert(key.clone(), self.resolve_value(&child_path, child)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.resolve_value(&child_path(path, index.to_string()), item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&mut self, path: &[String], text: &str) -> Result<Value, InterpolationError> {
        if !has_placeholders(text) {
            return Ok(Value::String(text.to_string()));
        }
        if let Some(done) = self.resolved.get(path) {
            return Ok(done.clone());
        }
        if let Some(start) = self.in_progress.iter().position(|p| p.as_slice() == path) {
            let chain = self.in_progress[start..]
                .iter()
                .map(|p| p.join("."))
                .chain(std::iter::once(path.join(".")))
                .collect();
            return Err(InterpolationError::Cycle { chain });
        }

        self.in_progress.push(path.to_vec());
        let expanded = self.expand(text);
        self.in_progress.pop();

        let expanded = expanded?;
        self.resolved.insert(path.to_vec(), expanded.clone());
        Ok(expanded)
    }

    fn expand(&mut self, text: &str) -> Result<Value, InterpolationError> {
        // A lone placeholder keeps the referenced value's type.
        if let Some(caps) = PLACEHOLDER.captures(text)
            && caps.get(1).is_none()
            && caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == text.len())
        {
            return self.reference(&caps[2]);
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            if caps.get(1).is_some() {
                // Escaped: drop the backslash, keep the placeholder text.
                out.push_str(&whole.as_str()[1..]);
            } else {
                let value = self.reference(&caps[2])?;
                out.push_str(&string_form(&value));
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(Value::String(out))
    }

    fn reference(&mut self, key: &str) -> Result<Value, InterpolationError> {
        let key = key.trim();
        let segments: KeyPath = key.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(InterpolationError::InvalidPlaceholder {
                placeholder: key.to_string(),
            });
        }
        let raw = lookup_segments(self.root, &segments).ok_or_else(|| {
            InterpolationError::UnknownKey {
                key: key.to_string(),
            }
        })?;
        self.resolve_value(&segments, raw)
    }
}

fn child_path(parent: &[String], segment: String) -> KeyPath {
    let mut path = parent.to_vec();
    path.push(segment);
    path
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
