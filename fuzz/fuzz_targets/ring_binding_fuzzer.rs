//! Fuzz target for ring construction and worker bindings
//!
//! Prevent circular wait via mis-ordered bindings
//!
//! # Strategy
//!
//! - Ring sizes: arbitrary, including 0 and sizes well past the default
//! - Worker pairs: arbitrary (possibly out-of-range) ring positions bound in
//!   either argument order
//! - Resource probes: acquire a worker's pair in binding order
//!
//! # Invariants
//!
//! - Size 0 MUST be rejected as a configuration error
//! - `low.id <= high.id` for every binding, equality only when self-bound
//! - Binding is symmetric in argument order
//! - Acquiring `low` then `high` on distinct resources NEVER blocks when idle
//! - Resources are free again once the guards drop

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use refectory_core::{ResourceRing, Worker};

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    /// Ring size, kept small enough to allocate quickly.
    size: u8,
    /// Ring positions to bind, reduced modulo the size.
    pairs: Vec<(u16, u16)>,
}

fuzz_target!(|input: FuzzInput| {
    let size = usize::from(input.size);

    let ring = match ResourceRing::create(size) {
        Ok(ring) => ring,
        Err(err) => {
            assert_eq!(size, 0);
            assert!(err.is_configuration());
            return;
        },
    };
    assert_eq!(ring.len(), size);

    for (index, (a, b)) in input.pairs.iter().enumerate() {
        let a = ring.get(usize::from(*a) % size).cloned().unwrap();
        let b = ring.get(usize::from(*b) % size).cloned().unwrap();

        let forward = Worker::new(index, a.clone(), b.clone());
        let reverse = Worker::new(index, b, a);

        let (low, high) = forward.binding();
        assert!(low <= high);
        assert_eq!(low == high, forward.is_self_bound());
        assert_eq!(forward.binding(), reverse.binding());

        if !forward.is_self_bound() {
            let low_guard = forward.low().try_acquire().unwrap();
            let high_guard = forward.high().try_acquire().unwrap();
            assert!(reverse.low().try_acquire().is_none());
            drop(high_guard);
            drop(low_guard);
        }

        assert!(!forward.low().is_held());
        assert!(!forward.high().is_held());
    }

    for index in 0..size {
        let (a, b) = ring.adjacent(index);
        let worker = Worker::new(index, a, b);
        assert_eq!(worker.is_self_bound(), size == 1);
    }
});
