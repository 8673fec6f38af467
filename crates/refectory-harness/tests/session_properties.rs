//! Property-based tests over ring size and delay seed.
//!
//! For every N >= 2 a run must finish within a bound proportional to
//! N x cycles x (max think + max eat), hold mutual exclusion on every
//! resource, and emit exactly the expected per-worker event sequence.

use std::time::Duration;

use proptest::prelude::*;
use refectory_core::EventKind;
use refectory_harness::{Scenario, check_mutual_exclusion, check_worker_sequences};

/// Scheduling and thread start-up allowance on top of the serial bound.
const SLACK: Duration = Duration::from_secs(2);

#[test]
fn prop_runs_terminate_without_deadlock() {
    proptest!(ProptestConfig::with_cases(32), |(
        workers in 2usize..=8,
        seed in any::<u64>(),
    )| {
        let scenario = Scenario::new(workers).with_seed(seed);
        let bound = scenario.serial_bound() + SLACK;

        let outcome = scenario.with_deadline(bound).run().expect("valid configuration");

        // PROPERTY: no deadlock, every worker reaches Done within the bound
        prop_assert!(!outcome.timed_out(), "workers={} seed={} missed {:?}", workers, seed, bound);
        prop_assert!(matches!(outcome.finished(), Some(Ok(_))));
    });
}

#[test]
fn prop_mutual_exclusion_holds() {
    proptest!(ProptestConfig::with_cases(32), |(
        workers in 2usize..=8,
        seed in any::<u64>(),
    )| {
        let outcome = Scenario::new(workers).with_seed(seed).run().expect("valid configuration");
        prop_assert!(matches!(outcome.finished(), Some(Ok(_))));

        // PROPERTY: no resource ever has two holders
        prop_assert_eq!(check_mutual_exclusion(&outcome.events), Ok(()));
        prop_assert!(outcome.ring.iter().all(|r| !r.is_held()));
    });
}

#[test]
fn prop_worker_event_sequences_are_exact() {
    proptest!(ProptestConfig::with_cases(32), |(
        workers in 2usize..=8,
        seed in any::<u64>(),
    )| {
        let outcome = Scenario::new(workers).with_seed(seed).run().expect("valid configuration");
        prop_assert!(matches!(outcome.finished(), Some(Ok(_))));

        // PROPERTY: (thought, low, high, ate) x 3 per worker, low < high
        prop_assert_eq!(check_worker_sequences(&outcome.events, workers), Ok(()));

        let eaten = outcome.count(|e| e.kind == EventKind::FinishedEating);
        prop_assert_eq!(eaten, workers * 3);
    });
}

#[test]
fn prop_event_timestamps_never_decrease_per_worker() {
    proptest!(ProptestConfig::with_cases(16), |(
        workers in 2usize..=6,
        seed in any::<u64>(),
    )| {
        let outcome = Scenario::new(workers).with_seed(seed).run().expect("valid configuration");

        for worker in 0..workers {
            let stamps: Vec<_> =
                outcome.events.iter().filter(|e| e.worker == worker).map(|e| e.at).collect();
            prop_assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "worker {}", worker);
        }
    });
}
