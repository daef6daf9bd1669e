//! Types library for the swap flow monitor
//!
//! Shared domain types for reported interest-rate-swap trades, detected
//! strategies and alerts, plus the numeric and tenor conventions every
//! consumer must agree on.
//!
//! # Modules
//! - `ids`: Identifiers (TradeId, StrategyId, AlertId)
//! - `trade`: Reported trades and package legs
//! - `strategy`: Multi-leg strategies
//! - `alert`: Alert notifications and severities
//! - `numeric`: Finite-value guards, rate normalization, notional parsing
//! - `tenor`: Canonical tenor order and duration table
//! - `time`: ISO-8601 timestamp parsing
//! - `errors`: Error taxonomy

pub mod ids;
pub mod trade;
pub mod strategy;
pub mod alert;
pub mod numeric;
pub mod tenor;
pub mod time;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alert::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::strategy::*;
    pub use crate::trade::*;
}
