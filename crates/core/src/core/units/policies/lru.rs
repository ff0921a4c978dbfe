//! Least Recently Used (LRU) Replacement Policy.
//!
//! The BTB ages every valid way of a set on each access to that set and
//! resets a way's age when it is written, so the oldest way is simply the one
//! with the largest counter. The policy itself is stateless.
//!
//! # Performance
//!
//! - **Time Complexity:** `victim()` is O(W) where W is the associativity.
//! - **Space Complexity:** O(1); ages live in the BTB entries.

use super::ReplacementPolicy;

/// LRU policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    /// Returns the first way holding the largest age.
    fn victim(&mut self, _set: usize, ages: &[u64]) -> usize {
        let mut oldest = 0;
        for (way, &age) in ages.iter().enumerate() {
            if age > ages[oldest] {
                oldest = way;
            }
        }
        oldest
    }

    fn name(&self) -> &'static str {
        "LRU"
    }
}
