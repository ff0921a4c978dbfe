//! BTB Replacement Policies.
//!
//! Selects the way to overwrite when a tag is allocated into a full set.
//!
//! # Policies
//!
//! - `Lru`: Largest age counter, first in way order on ties.
//! - `Random`: Uniformly random way from a seeded generator.

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

pub use lru::LruPolicy;
pub use random::RandomPolicy;

use crate::config::ReplacementPolicy as PolicyKind;

/// Trait for BTB replacement policies.
pub trait ReplacementPolicy: Send + Sync {
    /// Selects the way to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `set` - The BTB set index.
    /// * `ages` - Age counter of every way in the set, in way order.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn victim(&mut self, set: usize, ages: &[u64]) -> usize;

    /// Short policy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Builds the policy selected by `kind`.
///
/// # Arguments
///
/// * `kind` - Configured policy.
/// * `seed` - Seed for policies that draw random numbers.
pub fn build(kind: PolicyKind, seed: u64) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyKind::Lru => Box::new(LruPolicy),
        PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
    }
}
