//! Console event sink.

use std::io::{self, Write};

use refectory_core::{EventSink, LifecycleEvent};

/// Writes one `Worker <i> <description>` line per event to stdout.
///
/// Each line is written while holding the stdout lock, so lines from
/// different workers interleave but never tear.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for ConsoleSink {
    fn record(&self, event: &LifecycleEvent) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{event}").and_then(|()| out.flush()) {
            tracing::warn!(worker = event.worker, "failed to write event: {}", e);
        }
    }
}
