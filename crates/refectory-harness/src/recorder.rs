//! Event sink that keeps every event in recording order.

use parking_lot::Mutex;
use refectory_core::{EventKind, EventSink, LifecycleEvent};

/// Captures lifecycle events for later inspection.
///
/// Events are appended under a single lock, so the stored order is a valid
/// serialization of the run: a worker records `FinishedEating` before it
/// releases, and a successor records `AcquiredLow`/`AcquiredHigh` after it
/// acquires.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingSink {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events matching `kind`, ignoring resource ids.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| std::mem::discriminant(&e.kind) == std::mem::discriminant(&kind))
            .count()
    }

    /// Events rendered as log lines.
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &LifecycleEvent) {
        self.events.lock().push(*event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use refectory_core::ResourceId;

    use super::*;

    #[test]
    fn records_in_order() {
        let sink = RecordingSink::new();
        let at = Instant::now();

        sink.record(&LifecycleEvent { worker: 1, kind: EventKind::FinishedThinking, at });
        sink.record(&LifecycleEvent { worker: 0, kind: EventKind::AcquiredLow(ResourceId(0)), at });

        assert_eq!(sink.lines(), vec!["Worker 1 finished thinking", "Worker 0 acquired low resource"]);
        assert_eq!(sink.count(EventKind::AcquiredLow(ResourceId(9))), 1);
        assert_eq!(sink.count(EventKind::FinishedEating), 0);
    }
}
