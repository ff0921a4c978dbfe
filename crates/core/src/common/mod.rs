//! Common types and constants shared by every predictor and attack.
//!
//! This module provides the building blocks that the tables, the obfuscation
//! schemes and the attack engine agree on:
//! 1. **Address Space:** Masking and random draws for `addr_space`-bit addresses.
//! 2. **Constants:** Fixed key material and default process identifiers.
//! 3. **Security Domains:** The attacker/victim tag and the access context.
//! 4. **Error Handling:** Configuration and experiment error types.

/// Address-space width, masking and random address generation.
pub mod addr;

/// Fixed key material and default identifiers.
pub mod constants;

/// Security domains and per-access contexts.
pub mod domain;

/// Error types for configuration and experiment runs.
pub mod error;

pub use addr::AddrSpace;
pub use constants::{PID_ATTACKER, PID_VICTIM};
pub use domain::{Context, SecurityDomain};
pub use error::{ConfigError, ExperimentError};
