//! Diagnostic events for configuration resolution.
//!
//! Every event is written to `tracing`. Callers that want to inspect
//! warnings programmatically (skipped files, profile fallbacks, failed
//! interpolation) can attach an [`EventSink`].

use anyhow::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Severity of a resolution event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLevel::Debug => write!(f, "debug"),
            EventLevel::Info => write!(f, "info"),
            EventLevel::Warning => write!(f, "warning"),
        }
    }
}

/// What happened during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Discovery returned this many candidate files.
    FilesDiscovered { count: usize },
    /// A configuration file was parsed.
    FileLoaded { path: PathBuf },
    /// A configuration file failed to parse and was skipped.
    FileSkipped { path: PathBuf, reason: String },
    /// The requested profile was missing; the default profile was used.
    ProfileFallback { requested: String, used: String },
    /// A profile's inheritance chain was resolved.
    ProfileResolved { profile: String, keys: usize },
    /// An override tree was loaded from disk.
    OverrideLoaded { path: PathBuf },
    /// Placeholders were left unresolved.
    InterpolationFailed { reason: String },
    /// Trees were merged.
    Merged { sources: usize },
    /// Final configuration produced.
    Resolved { profile: String, keys: usize },
}

/// A single diagnostic emitted while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub level: EventLevel,
    pub kind: EventKind,
    pub message: String,
}

/// Receiver for resolution events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: ResolutionEvent);
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events at warning level.
    pub fn warnings(&self) -> Vec<ResolutionEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == EventLevel::Warning)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl EventSink for CollectingSink {
    fn record(&self, event: ResolutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Logger that writes to tracing and, optionally, an event sink.
#[derive(Clone)]
pub struct Logger {
    /// Programmatic receiver (optional).
    sink: Option<Arc<dyn EventSink>>,
    /// Minimum level delivered to the sink.
    min_level: EventLevel,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            sink: None,
            min_level: EventLevel::Debug,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Only deliver events at or above `level` to the sink.
    pub fn with_min_level(mut self, level: EventLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn log(&self, level: EventLevel, kind: EventKind, message: impl Into<String>) {
        let message = message.into();

        match level {
            EventLevel::Warning => tracing::warn!(target: "profile_config", "{}", message),
            EventLevel::Info => tracing::info!(target: "profile_config", "{}", message),
            EventLevel::Debug => tracing::debug!(target: "profile_config", "{}", message),
        }

        if level < self.min_level {
            return;
        }
        if let Some(ref sink) = self.sink {
            sink.record(ResolutionEvent {
                level,
                kind,
                message,
            });
        }
    }

    pub fn debug(&self, kind: EventKind, message: impl Into<String>) {
        self.log(EventLevel::Debug, kind, message);
    }

    pub fn info(&self, kind: EventKind, message: impl Into<String>) {
        self.log(EventLevel::Info, kind, message);
    }

    pub fn warning(&self, kind: EventKind, message: impl Into<String>) {
        self.log(EventLevel::Warning, kind, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sink", &self.sink.is_some())
            .field("min_level", &self.min_level)
            .finish()
    }
}

/// Install a global tracing subscriber.
///
/// `target` is `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a filename to
/// append to. `RUST_LOG` takes precedence over `verbose` when set.
pub fn init_tracing(target: &str, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match target {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
