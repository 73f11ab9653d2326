//! Profile resolution with inheritance support.
//!
//! A profile may name a parent through the inheritance key (`inherits` by
//! default). Parents are merged first, so a profile always wins over its
//! ancestors and a closer ancestor wins over a farther one. The result is
//! layered over the document's `defaults`.

use crate::error::{ProfileConfigError, Result};
use crate::logging::{EventKind, Logger};
use crate::merge::merge_trees;
use crate::tree::{ConfigDocument, ConfigTree, DEFAULT_INHERIT_KEY, PROFILES_KEY, type_name};
use serde_json::Value;

/// Resolves named profiles against a configuration document.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    inherit_key: String,
    logger: Logger,
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INHERIT_KEY)
    }
}

impl ProfileResolver {
    pub fn new(inherit_key: impl Into<String>) -> Self {
        Self {
            inherit_key: inherit_key.into(),
            logger: Logger::new(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// The key that names a profile's parent.
    pub fn inherit_key(&self) -> &str {
        &self.inherit_key
    }

    /// Resolve `requested` into its effective tree.
    ///
    /// Falls back to `default_profile` when `requested` does not exist and
    /// the default does. Without a `profiles` section the result is
    /// `defaults` overlaid by every non-reserved root key.
    pub fn resolve_profile(
        &self,
        document: &ConfigDocument<'_>,
        requested: &str,
        default_profile: &str,
    ) -> Result<ConfigTree> {
        let defaults = document.defaults()?.cloned().unwrap_or_default();

        let profiles = match document.profiles()? {
            Some(profiles) if !profiles.is_empty() => profiles,
            _ => {
                let root: ConfigTree = document
                    .root_values()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                return Ok(merge_trees(defaults, root));
            }
        };

        let name = if profiles.contains_key(requested) {
            requested
        } else if requested != default_profile && profiles.contains_key(default_profile) {
            self.logger.warning(
                EventKind::ProfileFallback {
                    requested: requested.to_string(),
                    used: default_profile.to_string(),
                },
                format!(
                    "Profile '{}' not found, using '{}'",
                    requested, default_profile
                ),
            );
            default_profile
        } else {
            return Err(ProfileConfigError::ProfileNotFound {
                profile: requested.to_string(),
                available: sorted_names(profiles),
            });
        };

        let resolved = self.resolve_chain(profiles, name, &[])?;
        let result = merge_trees(defaults, resolved);

        self.logger.debug(
            EventKind::ProfileResolved {
                profile: name.to_string(),
                keys: result.len(),
            },
            format!("Resolved profile '{}' with {} keys", name, result.len()),
        );
        Ok(result)
    }

    /// Walk `name`'s inheritance chain, parent first.
    ///
    /// `visited` holds the names on the path from the requested profile down
    /// to `name`'s child. Each recursive call gets its own extended copy.
    fn resolve_chain(
        &self,
        profiles: &ConfigTree,
        name: &str,
        visited: &[&str],
    ) -> Result<ConfigTree> {
        if visited.contains(&name) {
            let mut chain: Vec<String> = visited.iter().map(|v| v.to_string()).collect();
            chain.push(name.to_string());
            return Err(ProfileConfigError::CircularInheritance { chain });
        }

        let Some(raw) = profiles.get(name) else {
            return Err(match visited.last() {
                Some(child) => ProfileConfigError::InheritedProfileNotFound {
                    profile: name.to_string(),
                    inherited_by: child.to_string(),
                    available: sorted_names(profiles),
                },
                None => ProfileConfigError::ProfileNotFound {
                    profile: name.to_string(),
                    available: sorted_names(profiles),
                },
            });
        };

        let mut own = match raw {
            Value::Object(map) => map.clone(),
            Value::Null => ConfigTree::new(),
            other => {
                return Err(ProfileConfigError::invalid(
                    format!("{}.{}", PROFILES_KEY, name),
                    format!("profile must be a mapping, got {}", type_name(other)),
                ));
            }
        };

        let parent = match own.shift_remove(&self.inherit_key) {
            None | Some(Value::Null) => None,
            Some(Value::String(parent)) if parent.is_empty() => None,
            Some(Value::String(parent)) => Some(parent),
            Some(other) => {
                return Err(ProfileConfigError::invalid(
                    format!("{}.{}.{}", PROFILES_KEY, name, self.inherit_key),
                    format!("expected a profile name, got {}", type_name(&other)),
                ));
            }
        };

        match parent {
            Some(parent) => {
                let mut path = visited.to_vec();
                path.push(name);
                let inherited = self.resolve_chain(profiles, &parent, &path)?;
                Ok(merge_trees(inherited, own))
            }
            None => Ok(own),
        }
    }

    /// Profile names in document order.
    pub fn list_profiles(&self, document: &ConfigDocument<'_>) -> Vec<String> {
        match document.profiles() {
            Ok(Some(profiles)) => profiles.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// The document's `default_profile`, or `"default"`.
    pub fn default_profile<'a>(&self, document: &ConfigDocument<'a>) -> &'a str {
        document.default_profile()
    }
}

fn sorted_names(profiles: &ConfigTree) -> Vec<String> {
    let mut names: Vec<String> = profiles.keys().cloned().collect();
    names.sort();
    names
}
