//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples worker logic from system resources
//! (time, sleeping, randomness). This enables:
//!
//! - Deterministic Simulation: a seeded RNG and scaled sleeps make runs
//!   reproducible and fast without changing the acquisition algorithm.
//!
//! - Production Runtime: the system implementation uses real time and OS
//!   entropy without any code changes to the worker logic.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::{Duration, Instant};

/// Abstract environment providing time, sleeping, and randomness.
///
/// Workers run on native threads, so `sleep` blocks the calling thread. It is
/// the only suspension point a worker has apart from waiting on a resource.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: This method MUST return values that never decrease
    ///   within a single execution context.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for the specified duration.
    fn sleep(&self, duration: Duration);

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Determinism during simulations: Given the same RNG seed, this produces
    ///   the same sequence of bytes
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Draws a value uniformly from `[low, high]`.
    ///
    /// Uses the top 53 bits of `random_u64()` so every representable step of
    /// an `f64` mantissa is reachable. Returns `low` when the range is empty.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }

        #[allow(clippy::cast_precision_loss)]
        let unit = (self.random_u64() >> 11) as f64 / (1u64 << 53) as f64;
        (high - low).mul_add(unit, low)
    }
}
