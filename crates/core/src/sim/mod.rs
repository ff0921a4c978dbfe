//! Experiment harness.
//!
//! Builds the seven predictors under one configuration, runs the named
//! attack sweeps against each and writes one statistics row per sweep step.

/// Bench state and the experiment drivers.
pub mod bench;

/// Experiment names.
pub mod experiment;

pub use bench::Bench;
pub use experiment::Experiment;
