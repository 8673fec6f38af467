//! Deterministic simulation harness for Refectory testing.
//!
//! Seeded implementations of the `Environment` and `EventSink` collaborators,
//! plus the oracles used to judge a recorded run.
//!
//! # Oracle-Based Testing
//!
//! A run is recorded by [`RecordingSink`] and replayed by the checks in
//! [`oracle`]: mutual exclusion per resource, per-worker cycle order, and the
//! reference [`RingModel`] for worker bindings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod oracle;
pub mod recorder;
pub mod scenario;
pub mod sim_env;

pub use oracle::{RingModel, Violation, check_mutual_exclusion, check_worker_sequences};
pub use recorder::RecordingSink;
pub use scenario::{Completion, SCENARIO_TIME_UNIT, Scenario, ScenarioOutcome};
pub use sim_env::{EatFault, SimEnv};
