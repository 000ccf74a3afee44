//! Log line sinks.
//!
//! The interceptor renders traffic into individual lines and hands each one
//! to a [`LineSink`], which owns where the lines go. [`TracingSink`] is the
//! default destination and routes every line through the `tracing` crate.

use tracing::{debug, error, info, trace, warn, Level};

/// Destination for formatted log lines.
///
/// Implementations receive exactly one call per emitted line, in emission
/// order, and must not reorder or batch them.
pub trait LineSink: Send + Sync {
    /// Receive one formatted log line.
    fn log_message(&self, line: &str);
}

/// Sink that forwards every line to `tracing` at a configurable level.
///
/// # Examples
///
/// ```rust
/// use tracing::Level;
/// use wiretap::TracingSink;
///
/// let sink = TracingSink::default();
/// let verbose = TracingSink::with_level(Level::DEBUG);
/// ```
#[derive(Debug, Clone)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Create a sink that logs at INFO.
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Create a sink that logs at the given level.
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSink for TracingSink {
    fn log_message(&self, line: &str) {
        // Event macros need a const level, hence the dispatch.
        match self.level {
            Level::ERROR => error!(target: "wiretap", "{line}"),
            Level::WARN => warn!(target: "wiretap", "{line}"),
            Level::INFO => info!(target: "wiretap", "{line}"),
            Level::DEBUG => debug!(target: "wiretap", "{line}"),
            Level::TRACE => trace!(target: "wiretap", "{line}"),
        }
    }
}
