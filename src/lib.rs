//! Profile Config
//!
//! Hierarchical, profile-based configuration resolution:
//! - Discovery of `{config_name}/{profile_filename}.{ext}` up the directory tree
//! - Named profiles with inheritance and cycle detection
//! - Deep merging by precedence (defaults, profile chain, overrides)
//! - `${path}` interpolation, resolved once after overrides are applied
//!
//! ```no_run
//! use profile_config::ProfileConfigResolver;
//!
//! let config = ProfileConfigResolver::new("myapp")
//!     .with_profile("dev")
//!     .with_override("local-overrides.yaml")
//!     .resolve()?;
//! # Ok::<(), profile_config::ProfileConfigError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod interpolate;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod options;
pub mod profiles;
pub mod resolver;
pub mod tree;

pub use discovery::{ConfigDiscovery, Discover};
pub use error::{InterpolationError, LoadError, ProfileConfigError, Result};
pub use loader::{ConfigFormat, FileLoader, Load};
pub use logging::{CollectingSink, EventKind, EventLevel, EventSink, ResolutionEvent};
pub use merge::{ConfigMerger, deep_merge, deep_merge_all};
pub use options::{Override, ResolverOptions};
pub use profiles::ProfileResolver;
pub use resolver::ProfileConfigResolver;
pub use tree::{ConfigDocument, ConfigTree};
