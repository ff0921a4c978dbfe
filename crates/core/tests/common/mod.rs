//! Shared helpers for the core test suite.

/// Predictor builders and tracing setup.
pub mod harness;
