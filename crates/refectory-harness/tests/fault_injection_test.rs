//! Fault injection tests.
//!
//! A worker that panics while holding both of its resources must:
//! - release them during unwinding, so its neighbours are never starved
//! - not stop any other worker from completing all of its cycles
//! - surface as `WorkerFault` only after every worker has settled

use refectory_core::{EventKind, SimulationError};
use refectory_harness::{EatFault, Scenario, check_mutual_exclusion};

fn meals_by_worker(events: &[refectory_core::LifecycleEvent], workers: usize) -> Vec<usize> {
    let mut meals = vec![0; workers];
    for event in events.iter().filter(|e| e.kind == EventKind::FinishedEating) {
        meals[event.worker] += 1;
    }
    meals
}

#[test]
fn faulted_worker_releases_and_others_finish() {
    let outcome = Scenario::new(5).with_seed(3).with_eat_fault(2, 1).run().unwrap();
    assert_eq!(outcome.seed, 3);
    assert_eq!(outcome.fault, Some(EatFault { worker: 2, cycle: 1 }));

    let faulted = match outcome.finished() {
        Some(Err(err @ SimulationError::WorkerFault { .. })) => err.faulted_workers(),
        other => panic!("expected a worker fault, got {other:?}"),
    };
    assert_eq!(faulted, vec![2]);

    // Worker 2 finished cycle 0 and died inside cycle 1's consumption.
    assert_eq!(meals_by_worker(&outcome.events, 5), vec![3, 3, 1, 3, 3]);

    check_mutual_exclusion(&outcome.events).unwrap();
    assert!(outcome.ring.iter().all(|r| !r.is_held()), "unwinding must release both resources");
}

#[test]
fn fault_in_first_cycle_of_two_worker_ring() {
    let outcome = Scenario::new(2).with_seed(9).with_eat_fault(0, 0).run().unwrap();

    match outcome.finished() {
        Some(Err(SimulationError::WorkerFault { faults })) => {
            assert_eq!(faults.len(), 1);
            assert_eq!(faults[0].worker, 0);
            assert!(faults[0].reason.contains("injected fault"), "{}", faults[0].reason);
        },
        other => panic!("expected a worker fault, got {other:?}"),
    }

    // The survivor shares both resources with the faulted worker.
    assert_eq!(meals_by_worker(&outcome.events, 2), vec![0, 3]);
    assert!(outcome.ring.iter().all(|r| !r.is_held()));
}

#[test]
fn fault_in_last_cycle_still_reported() {
    let outcome = Scenario::new(3).with_seed(1).with_eat_fault(1, 2).run().unwrap();

    let err = match outcome.finished() {
        Some(Err(err)) => err,
        other => panic!("expected a worker fault, got {other:?}"),
    };
    assert!(!err.is_configuration());
    assert_eq!(err.faulted_workers(), vec![1]);
    assert_eq!(meals_by_worker(&outcome.events, 3), vec![3, 2, 3]);
}

#[test]
fn fault_for_missing_worker_never_fires() {
    let outcome = Scenario::new(3).with_seed(4).with_eat_fault(7, 0).run().unwrap();
    assert!(matches!(outcome.finished(), Some(Ok(summary)) if summary.meals == 9));
}
