//! Seeded simulation environment.
//!
//! `SimEnv` draws randomness from a shared ChaCha stream so a seed pins the
//! sequence of delays handed out. Sleeps are real: workers still run on
//! native threads in true parallel. Tests keep runs short by shrinking the
//! time unit (`Timing::scaled`), not by faking the clock.
//!
//! It can also inject a fault: a panic raised from inside the consumption
//! sleep of one chosen worker and cycle, which is the point where that worker
//! holds both of its resources.

use std::{
    cell::Cell,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use refectory_core::Environment;

thread_local! {
    /// Sleeps performed by the current thread, used to locate eat steps.
    static SLEEPS: Cell<u32> = const { Cell::new(0) };
}

/// Where to inject a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EatFault {
    /// Worker index whose consumption step panics.
    pub worker: usize,
    /// Zero-based cycle in which it panics.
    pub cycle: u32,
}

/// Deterministic-RNG environment for simulation tests.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha8Rng>>,
    fault: Option<EatFault>,
}

impl SimEnv {
    /// Environment whose random stream is fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        tracing::debug!(seed, "simulation environment seeded");
        Self { seed, rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))), fault: None }
    }

    /// Panic inside `worker`'s consumption sleep during `cycle`.
    #[must_use]
    pub fn with_eat_fault(mut self, worker: usize, cycle: u32) -> Self {
        self.fault = Some(EatFault { worker, cycle });
        self
    }

    /// Seed the random stream started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Configured fault, if any.
    pub fn fault(&self) -> Option<EatFault> {
        self.fault
    }

    /// Worker threads are named `worker-<index>` by the session.
    fn current_worker() -> Option<usize> {
        std::thread::current().name()?.strip_prefix("worker-")?.parse().ok()
    }

    #[allow(clippy::panic)]
    fn maybe_fault(&self) {
        let Some(fault) = self.fault else {
            return;
        };

        // Worker sleeps alternate think, eat, think, eat...
        let call = SLEEPS.with(|sleeps| {
            let call = sleeps.get();
            sleeps.set(call + 1);
            call
        });

        if Self::current_worker() == Some(fault.worker) && call == fault.cycle * 2 + 1 {
            panic!("injected fault in worker {} cycle {}", fault.worker, fault.cycle);
        }
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        self.maybe_fault();
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        let left: Vec<_> = (0..8).map(|_| a.random_u64()).collect();
        let right: Vec<_> = (0..8).map(|_| b.random_u64()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn different_seed_different_stream() {
        let a = SimEnv::with_seed(1);
        let b = SimEnv::with_seed(2);
        assert_ne!(a.random_u64(), b.random_u64());
    }

    #[test]
    fn clones_share_one_stream() {
        let a = SimEnv::with_seed(7);
        let b = a.clone();
        let reference = SimEnv::with_seed(7);

        let first = reference.random_u64();
        let second = reference.random_u64();

        assert_eq!(a.random_u64(), first);
        assert_eq!(b.random_u64(), second);
    }

    #[test]
    fn fault_ignores_unnamed_threads() {
        let env = SimEnv::with_seed(0).with_eat_fault(0, 0);

        let result = std::thread::spawn(move || {
            for _ in 0..4 {
                env.sleep(Duration::ZERO);
            }
        })
        .join();

        assert!(result.is_ok());
    }

    #[test]
    fn fault_fires_on_matching_eat_sleep() {
        let env = SimEnv::with_seed(0).with_eat_fault(3, 1);

        let result = std::thread::Builder::new()
            .name("worker-3".to_string())
            .spawn(move || {
                // think, eat, think all pass; the second eat panics
                for _ in 0..3 {
                    env.sleep(Duration::ZERO);
                }
                env.sleep(Duration::ZERO);
            })
            .unwrap()
            .join();

        assert!(result.is_err());
    }
}
