//! Session
//!
//! Owns one complete simulation run: the resource ring, the workers bound to
//! it, and the injected environment and event sink.
//!
//! ## Responsibilities
//!
//! - Construction: validate configuration, build the ring, bind worker `i`
//!   to resources `i` and `(i + 1) mod n`
//! - Execution: one native thread per worker, then a join of every thread
//! - Reporting: succeed only if every worker completed; otherwise list every
//!   faulted worker after all of them have settled

use std::{
    any::Any,
    thread,
    time::{Duration, Instant},
};

use crate::{
    config::SessionConfig,
    env::Environment,
    error::{SimulationError, WorkerFault},
    event::EventSink,
    resource::ResourceRing,
    worker::Worker,
};

/// Outcome of a run in which every worker reached `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of workers that ran.
    pub workers: usize,
    /// Completed eat steps across all workers.
    pub meals: u64,
    /// Time from the first spawn to the last join.
    pub elapsed: Duration,
}

/// Orchestrator of one simulation run.
pub struct Session<E, S>
where
    E: Environment,
    S: EventSink,
{
    config: SessionConfig,
    ring: ResourceRing,
    workers: Vec<Worker>,
    env: E,
    sink: S,
}

impl<E, S> Session<E, S>
where
    E: Environment,
    S: EventSink,
{
    /// Build a session of `worker_count` workers with default timing.
    pub fn create(worker_count: usize, env: E, sink: S) -> Result<Self, SimulationError> {
        Self::with_config(SessionConfig::with_workers(worker_count), env, sink)
    }

    /// Build a session from a full configuration.
    ///
    /// Fails with `InvalidConfiguration` before any worker exists.
    pub fn with_config(config: SessionConfig, env: E, sink: S) -> Result<Self, SimulationError> {
        config.validate()?;

        let ring = ResourceRing::create(config.worker_count)?;
        let workers: Vec<_> = (0..config.worker_count)
            .map(|i| {
                let (a, b) = ring.adjacent(i);
                Worker::new(i, a, b)
            })
            .collect();

        if workers.iter().any(Worker::is_self_bound) {
            tracing::warn!(
                workers = config.worker_count,
                "worker bound to the same resource twice; its first eat step will block forever"
            );
        }

        Ok(Self { config, ring, workers, env, sink })
    }

    /// Configuration the session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The shared resources.
    pub fn ring(&self) -> &ResourceRing {
        &self.ring
    }

    /// Workers in index order.
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Start every worker on its own thread and wait for all of them.
    ///
    /// Consumes the session; a session describes exactly one run.
    pub fn run(self) -> Result<RunSummary, SimulationError> {
        let started = self.env.now();
        tracing::info!(workers = self.workers.len(), "session starting");

        let mut faults = self.spawn_and_join();
        faults.sort_by_key(|f| f.worker);

        for fault in &faults {
            tracing::error!(worker = fault.worker, reason = %fault.reason, "worker faulted");
        }

        if !faults.is_empty() {
            return Err(SimulationError::WorkerFault { faults });
        }

        let summary = RunSummary {
            workers: self.workers.len(),
            meals: self.workers.iter().map(|w| u64::from(w.meals())).sum(),
            elapsed: elapsed_since(&self.env, started),
        };

        tracing::info!(
            workers = summary.workers,
            meals = summary.meals,
            elapsed_ms = summary.elapsed.as_millis(),
            "session complete"
        );

        Ok(summary)
    }

    fn spawn_and_join(&self) -> Vec<WorkerFault> {
        let env = &self.env;
        let sink = &self.sink;
        let timing = &self.config.timing;

        thread::scope(|scope| {
            let spawned: Vec<_> = self
                .workers
                .iter()
                .map(|worker| {
                    let handle = thread::Builder::new()
                        .name(format!("worker-{}", worker.index()))
                        .spawn_scoped(scope, move || worker.run(env, sink, timing));
                    (worker.index(), handle)
                })
                .collect();

            spawned
                .into_iter()
                .filter_map(|(worker, handle)| match handle {
                    Ok(handle) => handle
                        .join()
                        .err()
                        .map(|payload| WorkerFault { worker, reason: panic_message(&*payload) }),
                    Err(e) => Some(WorkerFault { worker, reason: format!("failed to spawn: {e}") }),
                })
                .collect()
        })
    }
}

fn elapsed_since<E: Environment>(env: &E, started: Instant) -> Duration {
    env.now().saturating_duration_since(started)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
