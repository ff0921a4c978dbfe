//! Branch predictor security simulator library.
//!
//! This crate models randomization-based secure branch predictors and the
//! side-channel attacks that measure how much they leak:
//! 1. **Tables:** Saturating-counter PHT and set-associative BTB with pluggable replacement.
//! 2. **Predictors:** Seven schemes (BaseBPU, BSUP, XorBP, NoisyXorBP, LSBP, STBPU, HyBP)
//!    that differ only in how addresses, targets and counters are transformed.
//! 3. **Crypto:** QARMA-64 and the XOR content encoding used by the schemes.
//! 4. **Attacks:** Reuse, eviction-set and occupancy-set searches that count predictor accesses.
//! 5. **Simulation:** Named experiment sweeps and their statistics rows.

/// Side-channel attack algorithms (reuse, prune, occupancy).
pub mod attacks;
/// Common types and constants (addresses, security domains, keys, errors).
pub mod common;
/// Predictor, attack and experiment configuration (defaults, enums, JSON loading).
pub mod config;
/// Predictor schemes and the tables they share.
pub mod core;
/// Block cipher and content encodings.
pub mod crypto;
/// Experiment harness (bench, named experiments).
pub mod sim;
/// Statistics rows and leakage histograms.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Common interface of all predictor schemes.
pub use crate::core::Predictor;
/// Enum over the seven schemes; construct with `PredictorWrapper::new` or `build_all`.
pub use crate::core::PredictorWrapper;
/// Experiment runner; construct with `Bench::new`.
pub use crate::sim::Bench;
