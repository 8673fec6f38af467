//! Oracles for recorded runs.
//!
//! The checks replay an event log produced by a `RecordingSink` and report
//! the first violation found. `RingModel` is the reference for which
//! resources each worker should be bound to.

use std::collections::HashMap;

use refectory_core::{EventKind, LifecycleEvent, ResourceId, Worker};
use thiserror::Error;

/// A property the event log failed to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// Two workers held one resource at the same time.
    #[error("event {position}: worker {intruder} acquired {resource} held by worker {holder}")]
    MutualExclusion {
        /// Contended resource.
        resource: ResourceId,
        /// Worker that already held it.
        holder: usize,
        /// Worker that acquired it anyway.
        intruder: usize,
        /// Index of the offending event.
        position: usize,
    },

    /// A worker's own events were out of cycle order.
    #[error("event {position}: worker {worker} expected {expected}, got {actual}")]
    OutOfOrder {
        /// Offending worker.
        worker: usize,
        /// Index of the offending event.
        position: usize,
        /// Description of the expected step.
        expected: &'static str,
        /// Description of the recorded step.
        actual: &'static str,
    },

    /// A worker acquired its higher resource id before its lower one.
    #[error("worker {worker} acquired {high} after {low} out of id order")]
    OrderInversion {
        /// Offending worker.
        worker: usize,
        /// Resource recorded as low.
        low: ResourceId,
        /// Resource recorded as high.
        high: ResourceId,
    },

    /// A worker emitted the wrong number of events.
    #[error("worker {worker} emitted {seen} events, expected {expected}")]
    EventCount {
        /// Offending worker.
        worker: usize,
        /// Events recorded.
        seen: usize,
        /// Events a complete run produces.
        expected: usize,
    },

    /// An event named a worker outside the session.
    #[error("event {position}: unknown worker {worker}")]
    UnknownWorker {
        /// Worker index recorded.
        worker: usize,
        /// Index of the offending event.
        position: usize,
    },
}

/// Events a worker emits per cycle.
pub const EVENTS_PER_CYCLE: usize = 4;

const CYCLE: [&str; EVENTS_PER_CYCLE] =
    ["finished thinking", "acquired low resource", "acquired high resource", "finished eating"];

/// Replay the log and verify no resource ever had two holders.
///
/// A worker holds a resource from its acquisition event until its next
/// `FinishedEating`.
pub fn check_mutual_exclusion(events: &[LifecycleEvent]) -> Result<(), Violation> {
    let mut holders: HashMap<ResourceId, usize> = HashMap::new();
    let mut held: HashMap<usize, Vec<ResourceId>> = HashMap::new();

    for (position, event) in events.iter().enumerate() {
        match event.kind {
            EventKind::AcquiredLow(resource) | EventKind::AcquiredHigh(resource) => {
                if let Some(&holder) = holders.get(&resource) {
                    return Err(Violation::MutualExclusion {
                        resource,
                        holder,
                        intruder: event.worker,
                        position,
                    });
                }
                holders.insert(resource, event.worker);
                held.entry(event.worker).or_default().push(resource);
            },
            EventKind::FinishedEating => {
                for resource in held.remove(&event.worker).unwrap_or_default() {
                    holders.remove(&resource);
                }
            },
            EventKind::FinishedThinking => {},
        }
    }

    Ok(())
}

/// Verify every worker emitted (thought, low, high, ate) exactly
/// `Worker::CYCLES` times, with `low < high`.
pub fn check_worker_sequences(events: &[LifecycleEvent], workers: usize) -> Result<(), Violation> {
    let mut seen = vec![0usize; workers];
    let mut last_low: Vec<Option<ResourceId>> = vec![None; workers];

    for (position, event) in events.iter().enumerate() {
        let worker = event.worker;
        let Some(count) = seen.get_mut(worker) else {
            return Err(Violation::UnknownWorker { worker, position });
        };

        let expected = CYCLE[*count % EVENTS_PER_CYCLE];
        let actual = event.kind.description();
        if expected != actual {
            return Err(Violation::OutOfOrder { worker, position, expected, actual });
        }

        match event.kind {
            EventKind::AcquiredLow(low) => last_low[worker] = Some(low),
            EventKind::AcquiredHigh(high) => {
                if let Some(low) = last_low[worker].filter(|low| *low >= high) {
                    return Err(Violation::OrderInversion { worker, low, high });
                }
            },
            EventKind::FinishedThinking | EventKind::FinishedEating => {},
        }

        *count += 1;
    }

    let expected = EVENTS_PER_CYCLE * Worker::CYCLES as usize;
    for (worker, &count) in seen.iter().enumerate() {
        if count != expected {
            return Err(Violation::EventCount { worker, seen: count, expected });
        }
    }

    Ok(())
}

/// Reference bindings for a ring of `size` resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingModel {
    size: usize,
}

impl RingModel {
    /// Model of a ring with `size` resources and workers.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Expected `(low, high)` ids for worker `index`.
    pub fn binding(&self, index: usize) -> (ResourceId, ResourceId) {
        let here = index % self.size;
        let next = (here + 1) % self.size;
        let a = ResourceId(u32::try_from(here).unwrap_or(u32::MAX));
        let b = ResourceId(u32::try_from(next).unwrap_or(u32::MAX));
        (a.min(b), a.max(b))
    }

    /// Expected bindings for every worker, in index order.
    pub fn bindings(&self) -> Vec<(ResourceId, ResourceId)> {
        (0..self.size).map(|i| self.binding(i)).collect()
    }

    /// How many worker bindings name each resource.
    ///
    /// Two per resource for rings of two or more. A ring of one counts its
    /// only resource twice because one worker names it twice.
    pub fn reference_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.size];
        for (low, high) in self.bindings() {
            counts[low.0 as usize] += 1;
            counts[high.0 as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn log(entries: &[(usize, EventKind)]) -> Vec<LifecycleEvent> {
        let at = Instant::now();
        entries.iter().map(|&(worker, kind)| LifecycleEvent { worker, kind, at }).collect()
    }

    fn full_cycle(worker: usize, low: u32, high: u32) -> Vec<(usize, EventKind)> {
        vec![
            (worker, EventKind::FinishedThinking),
            (worker, EventKind::AcquiredLow(ResourceId(low))),
            (worker, EventKind::AcquiredHigh(ResourceId(high))),
            (worker, EventKind::FinishedEating),
        ]
    }

    #[test]
    fn overlapping_holders_detected() {
        let events = log(&[
            (0, EventKind::AcquiredLow(ResourceId(0))),
            (1, EventKind::AcquiredLow(ResourceId(1))),
            (0, EventKind::AcquiredHigh(ResourceId(1))),
        ]);

        assert_eq!(
            check_mutual_exclusion(&events),
            Err(Violation::MutualExclusion {
                resource: ResourceId(1),
                holder: 1,
                intruder: 0,
                position: 2
            })
        );
    }

    #[test]
    fn handoff_after_eating_is_allowed() {
        let mut entries = full_cycle(0, 0, 1);
        entries.extend(full_cycle(1, 0, 1));
        assert_eq!(check_mutual_exclusion(&log(&entries)), Ok(()));
    }

    #[test]
    fn complete_sequences_pass() {
        let mut entries = Vec::new();
        for _ in 0..Worker::CYCLES {
            entries.extend(full_cycle(0, 0, 1));
            entries.extend(full_cycle(1, 0, 1));
        }
        assert_eq!(check_worker_sequences(&log(&entries), 2), Ok(()));
    }

    #[test]
    fn skipped_step_detected() {
        let events = log(&[
            (0, EventKind::FinishedThinking),
            (0, EventKind::AcquiredHigh(ResourceId(1))),
        ]);

        assert!(matches!(
            check_worker_sequences(&events, 1),
            Err(Violation::OutOfOrder { worker: 0, position: 1, .. })
        ));
    }

    #[test]
    fn inverted_acquisition_detected() {
        let events = log(&full_cycle(0, 3, 1));
        assert_eq!(
            check_worker_sequences(&events, 1),
            Err(Violation::OrderInversion { worker: 0, low: ResourceId(3), high: ResourceId(1) })
        );
    }

    #[test]
    fn truncated_run_detected() {
        let events = log(&full_cycle(0, 0, 1));
        assert_eq!(
            check_worker_sequences(&events, 1),
            Err(Violation::EventCount { worker: 0, seen: 4, expected: 12 })
        );
    }

    #[test]
    fn unknown_worker_detected() {
        let events = log(&[(5, EventKind::FinishedThinking)]);
        assert_eq!(
            check_worker_sequences(&events, 2),
            Err(Violation::UnknownWorker { worker: 5, position: 0 })
        );
    }

    #[test]
    fn ring_model_bindings() {
        let model = RingModel::new(4);
        assert_eq!(model.binding(3), (ResourceId(0), ResourceId(3)));
        assert_eq!(model.reference_counts(), vec![2, 2, 2, 2]);

        let single = RingModel::new(1);
        assert_eq!(single.binding(0), (ResourceId(0), ResourceId(0)));
        assert_eq!(single.reference_counts(), vec![2]);
    }
}
