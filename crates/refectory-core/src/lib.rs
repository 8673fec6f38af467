//! Refectory Core
//!
//! Deadlock-free acquisition of paired resources arranged in a ring.
//!
//! # Architecture
//!
//! ```text
//! Session
//!   ├─ ResourceRing   (N resources, sequential ids)
//!   ├─ Worker × N     (bound to resources i and (i+1) mod N, sorted by id)
//!   ├─ Environment    (time, sleep, randomness; injected)
//!   └─ EventSink      (lifecycle events; injected)
//! ```
//!
//! Every worker acquires its lower-id resource before its higher-id one.
//! That single global order is the whole deadlock-avoidance argument: no
//! worker ever waits on a lower id while holding a higher one, so no cycle of
//! waiting workers can form.
//!
//! # Components
//!
//! - [`ResourceRing`] / [`Resource`]: mutually exclusive, totally ordered
//! - [`Worker`]: think/eat cycle with scoped, ordered acquisition
//! - [`Session`]: construction, concurrent start, join-all
//! - [`Environment`]: injected time and randomness for deterministic tests
//! - [`EventSink`]: injected receiver of [`LifecycleEvent`]s

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod resource;
pub mod session;
pub mod worker;

pub use config::{DelayRange, SessionConfig, Timing};
pub use env::Environment;
pub use error::{SimulationError, WorkerFault};
pub use event::{EventKind, EventSink, LifecycleEvent, NullSink};
pub use resource::{Resource, ResourceGuard, ResourceId, ResourceRing};
pub use session::{RunSummary, Session};
pub use worker::{Worker, WorkerState};
