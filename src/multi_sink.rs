//! Composite sink for fanning lines out to several destinations.
//!
//! [`MultiSink`] lets console output and an in-memory capture observe the
//! same traffic without wrapping the interceptor twice.
//!
//! # Example
//!
//! ```rust
//! use wiretap::{MultiSink, TracingSink};
//!
//! let sink = MultiSink::new().with(TracingSink::default());
//! ```

use std::sync::Arc;

use crate::sink::LineSink;

/// A sink that delegates every line to multiple inner sinks.
///
/// Sinks receive each line in registration order, so per-sink ordering
/// guarantees are preserved.
pub struct MultiSink {
    sinks: Vec<Arc<dyn LineSink>>,
}

impl MultiSink {
    /// Create a new empty MultiSink.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink to the chain. Returns self for builder pattern.
    pub fn with<S: LineSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Returns true if no sinks have been added.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Returns the number of sinks in the chain.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for MultiSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSink for MultiSink {
    fn log_message(&self, line: &str) {
        for sink in &self.sinks {
            sink.log_message(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSink {
        count: Arc<AtomicUsize>,
    }

    impl LineSink for CountingSink {
        fn log_message(&self, _line: &str) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordingSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl LineSink for RecordingSink {
        fn log_message(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn empty_multi_sink_accepts_lines() {
        let sink = MultiSink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);

        // Should not panic with no sinks
        sink.log_message("dropped on the floor");
    }

    #[test]
    fn every_sink_sees_every_line() {
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        let sink = MultiSink::new()
            .with(CountingSink {
                count: count1.clone(),
            })
            .with(CountingSink {
                count: count2.clone(),
            });
        assert_eq!(sink.len(), 2);

        sink.log_message("one");
        sink.log_message("two");

        assert_eq!(count1.load(Ordering::SeqCst), 2);
        assert_eq!(count2.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lines_arrive_in_emission_order() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = MultiSink::new().with(RecordingSink {
            lines: lines.clone(),
        });

        sink.log_message("first");
        sink.log_message("second");
        sink.log_message("third");

        assert_eq!(*lines.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
