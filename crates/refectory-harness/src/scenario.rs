//! Scenario builder for simulated sessions.
//!
//! A scenario builds a `Session` over a `SimEnv` and a `RecordingSink`, runs
//! it on a background thread, and waits at most `deadline` for it to finish.
//! A run that misses the deadline is reported as `Completion::TimedOut`; its
//! threads are left blocked and reclaimed when the process exits.
//!
//! ```rust,ignore
//! let outcome = Scenario::new(5).with_seed(7).run()?;
//! assert!(matches!(outcome.finished(), Some(Ok(_))));
//! check_mutual_exclusion(&outcome.events)?;
//! ```

use std::{
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

use refectory_core::{
    EventKind, LifecycleEvent, ResourceRing, RunSummary, Session, SessionConfig, SimulationError,
    Timing,
};

use crate::{
    recorder::RecordingSink,
    sim_env::{EatFault, SimEnv},
};

/// Default time unit for scenarios: delays of 0.1..0.5 units become 0.1..0.5 ms.
pub const SCENARIO_TIME_UNIT: Duration = Duration::from_millis(1);

/// How a scenario run ended.
#[derive(Debug)]
pub enum Completion {
    /// `Session::run` returned.
    Finished(Result<RunSummary, SimulationError>),
    /// The deadline passed first.
    TimedOut,
    /// The runner thread exited without reporting a result.
    Aborted,
}

/// Everything observed from one scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// How the run ended.
    pub completion: Completion,
    /// Events recorded up to the end of the run or the deadline.
    pub events: Vec<LifecycleEvent>,
    /// The session's ring, still shared with any blocked workers.
    pub ring: ResourceRing,
    /// Wall-clock time until completion or deadline.
    pub elapsed: Duration,
    /// Seed the environment's delay stream started from.
    pub seed: u64,
    /// Fault the environment was armed with.
    pub fault: Option<EatFault>,
}

impl ScenarioOutcome {
    /// The session result, or `None` if the run timed out.
    pub fn finished(&self) -> Option<&Result<RunSummary, SimulationError>> {
        match &self.completion {
            Completion::Finished(result) => Some(result),
            Completion::TimedOut | Completion::Aborted => None,
        }
    }

    /// Whether the deadline passed before the run returned.
    pub fn timed_out(&self) -> bool {
        matches!(self.completion, Completion::TimedOut)
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, matches: impl Fn(&LifecycleEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }
}

/// Builder for a simulated run.
#[derive(Debug, Clone)]
pub struct Scenario {
    workers: usize,
    seed: u64,
    timing: Timing,
    deadline: Duration,
    fault: Option<(usize, u32)>,
}

impl Scenario {
    /// Scenario with `workers` workers, seed 0, and millisecond time units.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            seed: 0,
            timing: Timing::scaled(SCENARIO_TIME_UNIT),
            deadline: Duration::from_secs(30),
            fault: None,
        }
    }

    /// Seed for the delay stream.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override think/eat timing.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Longest time to wait for the run to return.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Make `worker` panic while holding both resources in `cycle`.
    #[must_use]
    pub fn with_eat_fault(mut self, worker: usize, cycle: u32) -> Self {
        self.fault = Some((worker, cycle));
        self
    }

    /// Upper bound on run time if no worker ever waited on a resource:
    /// every worker's every cycle back to back.
    pub fn serial_bound(&self) -> Duration {
        let cycles = u32::try_from(self.workers)
            .unwrap_or(u32::MAX)
            .saturating_mul(refectory_core::Worker::CYCLES);
        self.timing.max_cycle().saturating_mul(cycles)
    }

    /// Build and run the session.
    ///
    /// Returns `Err` only if the session could not be constructed, in which
    /// case no worker was started.
    pub fn run(self) -> Result<ScenarioOutcome, SimulationError> {
        let mut env = SimEnv::with_seed(self.seed);
        if let Some((worker, cycle)) = self.fault {
            env = env.with_eat_fault(worker, cycle);
        }

        let seed = env.seed();
        let fault = env.fault();
        let sink = Arc::new(RecordingSink::new());
        let config = SessionConfig { worker_count: self.workers, timing: self.timing };
        let session = Session::with_config(config, env, Arc::clone(&sink))?;
        let ring = session.ring().clone();

        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        std::thread::spawn(move || {
            // Receiver may be gone after a timeout.
            let _ = tx.send(session.run());
        });

        let completion = match rx.recv_timeout(self.deadline) {
            Ok(result) => Completion::Finished(result),
            Err(mpsc::RecvTimeoutError::Timeout) => Completion::TimedOut,
            Err(mpsc::RecvTimeoutError::Disconnected) => Completion::Aborted,
        };
        let elapsed = started.elapsed();

        if matches!(completion, Completion::TimedOut) {
            tracing::warn!(
                workers = self.workers,
                seed,
                deadline_ms = self.deadline.as_millis(),
                "scenario missed its deadline"
            );
        } else {
            tracing::debug!(
                workers = self.workers,
                seed,
                meals = sink.count(EventKind::FinishedEating),
                elapsed_ms = elapsed.as_millis(),
                "scenario settled"
            );
        }

        Ok(ScenarioOutcome { completion, events: sink.events(), ring, elapsed, seed, fault })
    }
}
