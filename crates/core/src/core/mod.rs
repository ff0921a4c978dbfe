//! Simulated predictor hardware.
//!
//! 1. **Units:** Scheme-agnostic PHT and BTB storage plus replacement policies.
//! 2. **Predictors:** The seven address-obfuscation schemes layered over the units.

/// The predictor contract and its seven implementations.
pub mod predictors;

/// Table storage and replacement policies.
pub mod units;

pub use predictors::{Predictor, PredictorWrapper};
