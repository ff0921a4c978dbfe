//! Table unit tests.

/// Set-associative target buffer.
pub mod btb;
