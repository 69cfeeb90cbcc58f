//! Random source abstraction and unbiased shuffling.
//!
//! Rotation sampling is driven through [`RandomSource`] so tests can supply
//! a deterministic sequence and assert the exact selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random values.
pub trait RandomSource: Send {
    /// Next value uniformly distributed in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// Reproducible source seeded from a fixed value.
#[derive(Debug)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    /// Create a source that replays the same sequence for the same seed.
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.gen()
    }
}

/// Source that cycles through a fixed sequence of values. Test helper.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<f64>,
    next: usize,
}

impl SequenceRandom {
    /// Create a source replaying `values` in order, wrapping around.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "SequenceRandom needs at least one value");
        Self { values, next: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

/// Unbiased Fisher–Yates shuffle driven by the given source.
pub fn shuffle<T>(items: &mut [T], random: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = (random.next_f64() * (i as f64 + 1.0)).floor() as usize;
        items.swap(i, j.min(i));
    }
}
