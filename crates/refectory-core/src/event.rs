//! Lifecycle events and the sink they are delivered to.
//!
//! Workers never write to a process-wide output. Every observable step is
//! handed to an injected [`EventSink`], which lets the binary print lines and
//! lets tests capture the exact sequence that was produced.

use std::{fmt, sync::Arc, time::Instant};

use crate::resource::ResourceId;

/// What a worker just did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Think delay elapsed.
    FinishedThinking,
    /// Lower-id resource granted.
    AcquiredLow(ResourceId),
    /// Higher-id resource granted while the lower one is held.
    AcquiredHigh(ResourceId),
    /// Consumption delay elapsed; both resources are about to be released.
    FinishedEating,
}

impl EventKind {
    /// Human-readable description used in log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FinishedThinking => "finished thinking",
            Self::AcquiredLow(_) => "acquired low resource",
            Self::AcquiredHigh(_) => "acquired high resource",
            Self::FinishedEating => "finished eating",
        }
    }

    /// Resource involved in an acquisition event.
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Self::AcquiredLow(id) | Self::AcquiredHigh(id) => Some(*id),
            Self::FinishedThinking | Self::FinishedEating => None,
        }
    }
}

/// Timestamped record of one worker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Index of the worker that emitted the event.
    pub worker: usize,
    /// The step taken.
    pub kind: EventKind,
    /// When the step completed, according to the session environment.
    pub at: Instant,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker {} {}", self.worker, self.kind.description())
    }
}

/// Receiver of lifecycle events.
///
/// Called from worker threads concurrently. Implementations must serialize
/// internally; the order in which `record` calls complete is the order the
/// events are considered to have happened.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn record(&self, event: &LifecycleEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(&self, event: &LifecycleEvent) {
        (**self).record(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &LifecycleEvent) {}
}
