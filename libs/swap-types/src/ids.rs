//! Identifier types for swap-feed entities
//!
//! Identifiers are assigned upstream (trade repository dissemination ids,
//! strategy-detector ids, alert ids), so they are opaque strings here.
//! All of them order lexicographically, which the trade index uses as its
//! tie-break for equal execution timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TypeError;

/// Dissemination identifier of a reported swap trade.
///
/// Unique within the trade store; MODI/TERM updates reuse the id of the
/// trade they amend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    /// Create a TradeId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Try to create a TradeId, rejecting blank identifiers.
    pub fn try_new(id: impl Into<String>) -> Result<Self, TypeError> {
        let s = id.into();
        if s.trim().is_empty() {
            return Err(TypeError::InvalidIdentifier {
                kind: "trade",
                value: s,
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a detected multi-leg strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(String);

impl StrategyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn try_new(id: impl Into<String>) -> Result<Self, TypeError> {
        let s = id.into();
        if s.trim().is_empty() {
            return Err(TypeError::InvalidIdentifier {
                kind: "strategy",
                value: s,
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of an alert notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_id_ordering_is_lexicographic() {
        let a = TradeId::new("1001");
        let b = TradeId::new("1002");
        assert!(a < b);
    }

    #[test]
    fn test_trade_id_try_new_rejects_blank() {
        assert!(TradeId::try_new("  ").is_err());
        assert!(TradeId::try_new("ABC123").is_ok());
    }

    #[test]
    fn test_strategy_id_try_new_rejects_blank() {
        let err = StrategyId::try_new("").unwrap_err();
        assert!(err.to_string().contains("strategy"));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TradeId::new("DTCC-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"DTCC-42\"");

        let back: TradeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_alert_id_display() {
        assert_eq!(AlertId::from("ALERT_1").to_string(), "ALERT_1");
    }
}
