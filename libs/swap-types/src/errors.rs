//! Error types for the swap domain types
//!
//! Decoding-level failures only; aggregation code never errors, it treats
//! missing values as absent.

use thiserror::Error;

/// Errors raised while building or decoding domain values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid notional: {0}")]
    InvalidNotional(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),
}
