//! Error definitions.
//!
//! Lookups, updates and attacks never fail: "no collision found" is an
//! ordinary, measured outcome carried in the result types. Errors are limited
//! to two places:
//! 1. **Construction:** Rejected table geometries and scheme parameters.
//! 2. **Experiments:** Statistic sinks that fail to accept output.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected predictor or experiment parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The PHT was configured with no counters.
    #[error("PHT must hold at least one counter")]
    EmptyPht,

    /// The counter width cannot be represented.
    #[error("counter width {0} is outside 1..=32 bits")]
    CounterBits(u32),

    /// The BTB was configured with no ways.
    #[error("BTB must have at least one way")]
    ZeroWays,

    /// Tag derivation needs a power-of-two set count.
    #[error("BTB set count {0} is not a positive power of two")]
    SetsNotPowerOfTwo(usize),

    /// The address width is outside the supported range.
    #[error("address space width {0} is outside 1..=64 bits")]
    AddrSpace(u32),

    /// The index offset discards every address bit.
    #[error("index offset {offset} leaves no bits of a {addr_space}-bit address")]
    Offset {
        /// Configured offset.
        offset: u32,
        /// Configured address width.
        addr_space: u32,
    },

    /// The noise injection rate is not a probability.
    #[error("noise rate {0} is not within 0.0..=1.0")]
    NoiseRate(f64),

    /// The block cipher only defines eight round constants.
    #[error("cipher rounds {0} is outside 1..=8")]
    CipherRounds(u32),

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The configuration text is not valid JSON for [`Config`](crate::Config).
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures while running a named experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// Predictor construction failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The statistics sink rejected a row.
    #[error("failed to write statistics: {0}")]
    Io(#[from] io::Error),

    /// The experiment name is not one of the known commands.
    #[error("unknown experiment `{0}`")]
    UnknownExperiment(String),
}
