//! Attack algorithm tests.

/// Occupancy-set construction and verification.
pub mod occupancy;

/// Eviction-set construction.
pub mod prune;
