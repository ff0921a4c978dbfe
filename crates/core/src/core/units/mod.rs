//! Predictor storage units.
//!
//! The units store whatever index, tag and content values the scheme hands
//! them; all address obfuscation happens in [`crate::core::predictors`].

/// Set-associative Branch Target Buffer.
pub mod btb;

/// Direct-indexed Pattern History Table.
pub mod pht;

/// BTB victim selection.
pub mod policies;

pub use btb::{Btb, BtbOutcome};
pub use pht::Pht;
