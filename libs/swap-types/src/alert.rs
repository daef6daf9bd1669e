//! Alert notifications

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TypeError;
use crate::ids::{AlertId, StrategyId, TradeId};
use crate::numeric::{deserialize_lenient_f64, sanitize};
use crate::time::deserialize_timestamp;

/// Alert severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl FromStr for Severity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            _ => Err(TypeError::UnknownSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert raised for a trade, a strategy, or market activity.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: AlertId,
    /// LargeTrade, StrategyPackage, Trend, ...
    #[serde(default)]
    pub alert_type: Option<String>,
    pub severity: Severity,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub trade_id: Option<TradeId>,
    #[serde(default)]
    pub strategy_id: Option<StrategyId>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub notional_eur: Option<f64>,
}

impl Alert {
    pub fn new(
        alert_id: AlertId,
        severity: Severity,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            alert_id,
            alert_type: None,
            severity,
            timestamp,
            message: message.into(),
            trade_id: None,
            strategy_id: None,
            notional_eur: None,
        }
    }

    pub fn id(&self) -> &AlertId {
        &self.alert_id
    }

    pub fn sanitize(&mut self) {
        self.notional_eur = sanitize(self.notional_eur);
    }
}
