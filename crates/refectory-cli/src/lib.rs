//! Refectory command-line runner.
//!
//! Wires the core simulation to production collaborators:
//!
//! ```text
//! refectory-cli
//!   ├─ SystemEnv     (system time, thread sleeps, OS randomness)
//!   ├─ ConsoleSink   (one stdout line per lifecycle event)
//!   └─ Session       (from refectory-core)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod console;
mod system_env;

pub use console::ConsoleSink;
use refectory_core::{Environment, EventSink, RunSummary, Session, SessionConfig, SimulationError};
pub use system_env::SystemEnv;

/// Default number of workers.
pub const DEFAULT_WORKERS: i64 = 5;

/// Convert a raw worker count into a session configuration.
///
/// Negative counts are rejected here; zero is rejected by
/// `SessionConfig::validate`.
pub fn session_config(workers: i64) -> Result<SessionConfig, SimulationError> {
    let worker_count = usize::try_from(workers).map_err(|_| {
        SimulationError::invalid(format!("worker count must be a positive integer, got {workers}"))
    })?;

    let config = SessionConfig::with_workers(worker_count);
    config.validate()?;
    Ok(config)
}

/// Run one session with production collaborators.
///
/// Blocks until every worker has settled.
pub fn run(workers: i64) -> Result<RunSummary, SimulationError> {
    run_with(session_config(workers)?, SystemEnv::new(), ConsoleSink::new())
}

/// Run one session over the given environment and sink.
pub fn run_with<E, S>(config: SessionConfig, env: E, sink: S) -> Result<RunSummary, SimulationError>
where
    E: Environment,
    S: EventSink,
{
    Session::with_config(config, env, sink)?.run()
}

/// Log how a run ended and keep only the error, which becomes the exit status.
pub fn report(result: Result<RunSummary, SimulationError>) -> Result<(), SimulationError> {
    match result {
        Ok(summary) => {
            tracing::info!(
                meals = summary.meals,
                elapsed_ms = summary.elapsed.as_millis(),
                "All workers done"
            );
            Ok(())
        },
        Err(e) if e.is_configuration() => {
            tracing::error!("Refusing to start: {}", e);
            Err(e)
        },
        Err(e) => {
            tracing::error!(workers = ?e.faulted_workers(), "Run failed: {}", e);
            Err(e)
        },
    }
}
