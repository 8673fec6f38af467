//! Session configuration.

use std::time::Duration;

use crate::error::SimulationError;

/// Inclusive range of delays, measured in time units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    /// Shortest delay.
    pub min: f64,
    /// Longest delay.
    pub max: f64,
}

impl DelayRange {
    /// Create a range from `min` to `max` time units.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<(), SimulationError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SimulationError::invalid(format!("{name} delay bounds must be finite")));
        }
        if self.min < 0.0 {
            return Err(SimulationError::invalid(format!(
                "{name} delay minimum {} is negative",
                self.min
            )));
        }
        if self.min > self.max {
            return Err(SimulationError::invalid(format!(
                "{name} delay minimum {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Delay ranges for the think and eat steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Think delay, default `[0.1, 0.5]`.
    pub think: DelayRange,
    /// Consumption delay, default `[0.1, 0.3]`.
    pub eat: DelayRange,
    /// Wall-clock length of one time unit, default one second.
    pub time_unit: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            think: DelayRange::new(0.1, 0.5),
            eat: DelayRange::new(0.1, 0.3),
            time_unit: Duration::from_secs(1),
        }
    }
}

impl Timing {
    /// Default ranges with a different time unit.
    pub fn scaled(time_unit: Duration) -> Self {
        Self { time_unit, ..Self::default() }
    }

    /// Convert a delay in time units to a wall-clock duration.
    ///
    /// Negative delays clamp to zero and unrepresentable ones saturate at
    /// `Duration::MAX`. `validate` rejects timings that would reach either.
    pub fn duration(&self, units: f64) -> Duration {
        self.checked_duration(units.max(0.0)).unwrap_or(Duration::MAX)
    }

    fn checked_duration(&self, units: f64) -> Option<Duration> {
        Duration::try_from_secs_f64(self.time_unit.as_secs_f64() * units).ok()
    }

    /// Upper bound of one think/eat cycle.
    pub fn max_cycle(&self) -> Duration {
        self.duration(self.think.max + self.eat.max)
    }

    /// Reject non-finite, negative, or inverted ranges, and ranges whose
    /// longest cycle does not fit in a `Duration`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.think.validate("think")?;
        self.eat.validate("eat")?;

        let cycle = self.think.max + self.eat.max;
        if self.checked_duration(cycle).is_none() {
            return Err(SimulationError::invalid(format!(
                "think and eat maxima of {cycle} units overflow a {:?} time unit",
                self.time_unit
            )));
        }
        Ok(())
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Number of workers, which is also the number of ring resources.
    pub worker_count: usize,
    /// Think and eat delays.
    pub timing: Timing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { worker_count: 5, timing: Timing::default() }
    }
}

impl SessionConfig {
    /// Default timing with `worker_count` workers.
    pub fn with_workers(worker_count: usize) -> Self {
        Self { worker_count, ..Self::default() }
    }

    /// Check the configuration before anything is built.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.worker_count < 1 {
            return Err(SimulationError::invalid(format!(
                "worker count must be at least 1, got {}",
                self.worker_count
            )));
        }
        self.timing.validate()
    }
}
