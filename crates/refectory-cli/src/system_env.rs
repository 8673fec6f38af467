//! Production Environment implementation using system time and RNG.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait that uses real system time, blocking thread sleeps,
//! and OS randomness.

use std::time::{Duration, Instant};

use refectory_core::Environment;

/// Production environment using system time and OS randomness.
///
/// This implementation:
/// - Uses `std::time::Instant::now()` for time
/// - Uses `std::thread::sleep()` for blocking sleeps
/// - Uses `getrandom` for randomness
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // NOTE: Delays fall back to the low end of their range. A run still
            // completes, it just loses its jitter.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_time_advances() {
        let env = SystemEnv::new();

        let t1 = env.now();
        env.sleep(Duration::from_millis(10));
        let t2 = env.now();

        assert!(t2 - t1 >= Duration::from_millis(10), "Sleep should wait at least 10ms");
    }

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn system_env_uniform_in_range() {
        let env = SystemEnv::new();

        for _ in 0..100 {
            let value = env.uniform(0.1, 0.3);
            assert!((0.1..=0.3).contains(&value), "{value} escaped [0.1, 0.3]");
        }
    }
}
