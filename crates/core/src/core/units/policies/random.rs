//! Random Replacement Policy.
//!
//! Selects a victim way uniformly at random, ignoring ages. The generator is
//! seeded at construction so runs with a fixed seed are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ReplacementPolicy;

/// Random policy state.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a random policy seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn victim(&mut self, _set: usize, ages: &[u64]) -> usize {
        self.rng.random_range(0..ages.len().max(1))
    }

    fn name(&self) -> &'static str {
        "RANDOM"
    }
}
