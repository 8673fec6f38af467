//! Simulation error types.

use std::fmt;

use thiserror::Error;

/// A worker whose run loop terminated abnormally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    /// Index of the faulted worker.
    pub worker: usize,
    /// Panic payload rendered as text.
    pub reason: String,
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {}: {}", self.worker, self.reason)
    }
}

/// Errors from session construction and execution.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration rejected before any worker started.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the rejected value.
        reason: String,
    },

    /// One or more workers faulted. Reported only after every worker settled.
    #[error("{} worker(s) faulted: {}", .faults.len(), render_faults(.faults))]
    WorkerFault {
        /// Every faulted worker, ordered by index.
        faults: Vec<WorkerFault>,
    },
}

impl SimulationError {
    /// Shorthand for an `InvalidConfiguration` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }

    /// Returns true if the run was rejected before starting.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Indices of faulted workers, empty for configuration errors.
    pub fn faulted_workers(&self) -> Vec<usize> {
        match self {
            Self::WorkerFault { faults } => faults.iter().map(|f| f.worker).collect(),
            Self::InvalidConfiguration { .. } => Vec::new(),
        }
    }
}

fn render_faults(faults: &[WorkerFault]) -> String {
    faults.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_display() {
        let err = SimulationError::invalid("worker count must be at least 1");
        assert_eq!(err.to_string(), "invalid configuration: worker count must be at least 1");
        assert!(err.is_configuration());
        assert!(err.faulted_workers().is_empty());
    }

    #[test]
    fn worker_fault_lists_every_worker() {
        let err = SimulationError::WorkerFault {
            faults: vec![
                WorkerFault { worker: 1, reason: "boom".to_string() },
                WorkerFault { worker: 3, reason: "bang".to_string() },
            ],
        };

        assert!(!err.is_configuration());
        assert_eq!(err.faulted_workers(), vec![1, 3]);
        assert_eq!(err.to_string(), "2 worker(s) faulted: worker 1: boom; worker 3: bang");
    }
}
