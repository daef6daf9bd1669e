//! Inbound event definitions for the flow engine
//!
//! Every stream message is a JSON envelope `{"type", "data", "timestamp"}`.
//! `EventKind` names the six kinds the engine consumes; `InboundEvent`
//! carries the typed payload once the ingestion layer has sanitized and
//! decoded it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use swap_types::alert::Alert;
use swap_types::strategy::Strategy;
use swap_types::time::deserialize_opt_timestamp;
use swap_types::trade::Trade;

use crate::analytics::Analytics;

/// Kind of an inbound stream message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Bulk trades + strategies (+ optional precomputed analytics)
    InitialState,
    NewTrade,
    TradeUpdated,
    StrategyDetected,
    Alert,
    /// Fully precomputed analytics, superseding local recomputation
    AnalyticsUpdate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::InitialState => "initial_state",
            EventKind::NewTrade => "new_trade",
            EventKind::TradeUpdated => "trade_updated",
            EventKind::StrategyDetected => "strategy_detected",
            EventKind::Alert => "alert",
            EventKind::AnalyticsUpdate => "analytics_update",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial_state" => Ok(EventKind::InitialState),
            "new_trade" => Ok(EventKind::NewTrade),
            "trade_updated" => Ok(EventKind::TradeUpdated),
            "strategy_detected" => Ok(EventKind::StrategyDetected),
            "alert" => Ok(EventKind::Alert),
            "analytics_update" => Ok(EventKind::AnalyticsUpdate),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw wire envelope, before the payload is sanitized and typed.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    /// Publisher clock; informational only.
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Bulk state pushed on (re)connect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialState {
    pub trades: Vec<Trade>,
    pub strategies: Vec<Strategy>,
    pub analytics: Option<Analytics>,
    /// Elements dropped because they failed to decode.
    pub skipped: usize,
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    InitialState(InitialState),
    NewTrade(Trade),
    TradeUpdated(Trade),
    StrategyDetected(Strategy),
    Alert(Alert),
    AnalyticsUpdate(Box<Analytics>),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::InitialState(_) => EventKind::InitialState,
            InboundEvent::NewTrade(_) => EventKind::NewTrade,
            InboundEvent::TradeUpdated(_) => EventKind::TradeUpdated,
            InboundEvent::StrategyDetected(_) => EventKind::StrategyDetected,
            InboundEvent::Alert(_) => EventKind::Alert,
            InboundEvent::AnalyticsUpdate(_) => EventKind::AnalyticsUpdate,
        }
    }

    /// Event type as a string label for logging.
    pub fn event_type_label(&self) -> &'static str {
        self.kind().as_str()
    }
}
