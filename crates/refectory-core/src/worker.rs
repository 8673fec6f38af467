//! Worker
//!
//! A worker is bound to two adjacent ring resources and runs a fixed number
//! of think/eat cycles on its own thread.
//!
//! ## Deadlock avoidance
//!
//! At construction the two resources are sorted by [`ResourceId`] into `low`
//! and `high`. Every worker acquires `low` first and only then `high`, so
//! acquisition order is globally consistent. A cycle of waiting workers would
//! need some worker to hold a higher id while waiting on a lower one, which
//! never happens.
//!
//! ## State machine
//!
//! ```text
//! Thinking → Hungry → HoldingLow → HoldingBoth → Releasing ─┐
//!    ▲                                                      │
//!    └──────────────────────── (CYCLES times) ──────────────┘
//!    │
//!    └→ Done
//! ```
//!
//! A worker that faults keeps whatever state it had when it unwound.

use std::sync::{
    Arc,
    atomic::{AtomicU8, AtomicU32, Ordering},
};

use crate::{
    config::Timing,
    env::Environment,
    event::{EventKind, EventSink, LifecycleEvent},
    resource::{Resource, ResourceId},
};

/// Position of a worker in its think/eat cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Sleeping through the think delay.
    Thinking = 0,
    /// Waiting for the low resource.
    Hungry = 1,
    /// Holding low, waiting for high.
    HoldingLow = 2,
    /// Holding both resources and consuming.
    HoldingBoth = 3,
    /// Giving both resources back.
    Releasing = 4,
    /// All cycles complete.
    Done = 5,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Thinking,
            1 => Self::Hungry,
            2 => Self::HoldingLow,
            3 => Self::HoldingBoth,
            4 => Self::Releasing,
            5 => Self::Done,
            other => {
                debug_assert!(false, "corrupt worker state discriminant {other}");
                Self::Done
            },
        }
    }

    /// Whether `self → next` is an edge of the state machine.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Thinking, Self::Hungry | Self::Done)
                | (Self::Hungry, Self::HoldingLow)
                | (Self::HoldingLow, Self::HoldingBoth)
                | (Self::HoldingBoth, Self::Releasing)
                | (Self::Releasing, Self::Thinking)
        )
    }

    /// Whether the worker holds at least one resource in this state.
    pub fn holds_resources(self) -> bool {
        matches!(self, Self::HoldingLow | Self::HoldingBoth | Self::Releasing)
    }
}

/// A concurrent unit bound to two ring resources.
#[derive(Debug)]
pub struct Worker {
    index: usize,
    low: Arc<Resource>,
    high: Arc<Resource>,
    state: AtomicU8,
    meals: AtomicU32,
}

impl Worker {
    /// Think/eat cycles per run.
    pub const CYCLES: u32 = 3;

    /// Bind a worker to two resources, ordering them by id.
    ///
    /// If both arguments are the same resource (a ring of one), `low` and
    /// `high` alias each other and the first eat step blocks forever.
    pub fn new(index: usize, resource_a: Arc<Resource>, resource_b: Arc<Resource>) -> Self {
        let (low, high) = if resource_a.id() <= resource_b.id() {
            (resource_a, resource_b)
        } else {
            (resource_b, resource_a)
        };

        Self {
            index,
            low,
            high,
            state: AtomicU8::new(WorkerState::Thinking as u8),
            meals: AtomicU32::new(0),
        }
    }

    /// Position of this worker in the session.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Resource acquired first.
    pub fn low(&self) -> &Arc<Resource> {
        &self.low
    }

    /// Resource acquired second.
    pub fn high(&self) -> &Arc<Resource> {
        &self.high
    }

    /// Both bindings denote the same resource.
    pub fn is_self_bound(&self) -> bool {
        Arc::ptr_eq(&self.low, &self.high)
    }

    /// Ids of the bound resources, `(low, high)`.
    pub fn binding(&self) -> (ResourceId, ResourceId) {
        (self.low.id(), self.high.id())
    }

    /// Current state, readable from any thread.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Completed eat steps so far.
    pub fn meals(&self) -> u32 {
        self.meals.load(Ordering::Acquire)
    }

    /// Run `CYCLES` think/eat cycles, then move to `Done`.
    ///
    /// Blocks the calling thread. A panic raised by the environment or sink
    /// while resources are held unwinds through the guards, which releases
    /// them before the thread terminates.
    pub fn run<E, S>(&self, env: &E, sink: &S, timing: &Timing)
    where
        E: Environment,
        S: EventSink + ?Sized,
    {
        for _ in 0..Self::CYCLES {
            self.think(env, sink, timing);
            self.eat(env, sink, timing);
        }

        self.transition(WorkerState::Done);
    }

    fn think<E, S>(&self, env: &E, sink: &S, timing: &Timing)
    where
        E: Environment,
        S: EventSink + ?Sized,
    {
        let delay = env.uniform(timing.think.min, timing.think.max);
        env.sleep(timing.duration(delay));
        self.emit(env, sink, EventKind::FinishedThinking);
    }

    fn eat<E, S>(&self, env: &E, sink: &S, timing: &Timing)
    where
        E: Environment,
        S: EventSink + ?Sized,
    {
        self.transition(WorkerState::Hungry);

        let low = self.low.acquire();
        self.transition(WorkerState::HoldingLow);
        self.emit(env, sink, EventKind::AcquiredLow(low.id()));

        let high = self.high.acquire();
        self.transition(WorkerState::HoldingBoth);
        self.emit(env, sink, EventKind::AcquiredHigh(high.id()));

        let delay = env.uniform(timing.eat.min, timing.eat.max);
        env.sleep(timing.duration(delay));
        self.emit(env, sink, EventKind::FinishedEating);
        self.meals.fetch_add(1, Ordering::AcqRel);

        self.transition(WorkerState::Releasing);
        drop(high);
        drop(low);
        self.transition(WorkerState::Thinking);
    }

    fn emit<E, S>(&self, env: &E, sink: &S, kind: EventKind)
    where
        E: Environment,
        S: EventSink + ?Sized,
    {
        let event = LifecycleEvent { worker: self.index, kind, at: env.now() };
        tracing::debug!(worker = self.index, resource = ?kind.resource(), "{}", kind.description());
        sink.record(&event);
    }

    fn transition(&self, next: WorkerState) {
        let prev = WorkerState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));
        debug_assert!(prev.can_transition_to(next), "illegal transition {prev:?} -> {next:?}");
        tracing::trace!(
            worker = self.index,
            from = ?prev,
            to = ?next,
            holding = next.holds_resources(),
            "state transition"
        );
    }
}
