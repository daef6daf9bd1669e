//! Event ingestion layer for the flow engine
//!
//! Rewrites bare non-finite literals, parses the wire envelope, runs the
//! recursive sanitizer over the payload, and decodes it into an
//! `InboundEvent`. Failures are reported as
//! `IngestionError` and never reach the stores.
//!
//! `initial_state` arrays are decoded element by element so one bad trade
//! does not cost the rest of the snapshot.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::analytics::Analytics;
use crate::events::{Envelope, EventKind, InboundEvent, InitialState};
use crate::metrics::EngineMetrics;
use crate::sanitize::{replace_non_finite_literals, sanitize_value};

/// Errors that can occur during event ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestionError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: EventKind, reason: String },
}

/// Decodes raw stream lines into typed events.
///
/// Drops and sanitizer replacements are recorded on the shared engine
/// metrics.
pub struct EventIngester {
    metrics: Arc<EngineMetrics>,
}

impl EventIngester {
    pub fn new(metrics: Arc<EngineMetrics>) -> Self {
        Self { metrics }
    }

    /// Decode one raw message.
    pub fn ingest(&self, raw: &str) -> Result<InboundEvent, IngestionError> {
        match self.decode(raw) {
            Ok(event) => {
                debug!(event_type = event.event_type_label(), "Event accepted");
                Ok(event)
            }
            Err(err) => {
                self.metrics.record_event_dropped();
                warn!(error = %err, "Dropping inbound message");
                Err(err)
            }
        }
    }

    fn decode(&self, raw: &str) -> Result<InboundEvent, IngestionError> {
        let (text, literals) = replace_non_finite_literals(raw);
        if literals > 0 {
            self.metrics.record_leaves_sanitized(literals as u64);
            debug!(literals, "Replaced bare non-finite literals");
        }
        let value: Value =
            serde_json::from_str(&text).map_err(|e| IngestionError::Malformed(e.to_string()))?;
        self.decode_value(value)
    }

    fn decode_value(&self, value: Value) -> Result<InboundEvent, IngestionError> {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| IngestionError::Malformed(e.to_string()))?;
        let kind: EventKind = envelope
            .kind
            .parse()
            .map_err(IngestionError::UnknownKind)?;

        let mut data = envelope.data;
        let replaced = sanitize_value(&mut data);
        if replaced > 0 {
            self.metrics.record_leaves_sanitized(replaced as u64);
            debug!(event_type = kind.as_str(), replaced, "Sanitized non-finite leaves");
        }

        let event = match kind {
            EventKind::InitialState => InboundEvent::InitialState(decode_initial_state(data)?),
            EventKind::NewTrade => InboundEvent::NewTrade(typed(kind, data)?),
            EventKind::TradeUpdated => InboundEvent::TradeUpdated(typed(kind, data)?),
            EventKind::StrategyDetected => InboundEvent::StrategyDetected(typed(kind, data)?),
            EventKind::Alert => InboundEvent::Alert(typed(kind, data)?),
            EventKind::AnalyticsUpdate => {
                InboundEvent::AnalyticsUpdate(Box::new(typed::<Analytics>(kind, data)?))
            }
        };
        Ok(event)
    }
}

fn decode_initial_state(data: Value) -> Result<InitialState, IngestionError> {
    let Value::Object(mut fields) = data else {
        return Err(IngestionError::InvalidPayload {
            kind: EventKind::InitialState,
            reason: "expected an object".to_string(),
        });
    };

    let mut state = InitialState::default();
    state.trades = decode_elements(fields.remove("trades"), "trade", &mut state.skipped);
    state.strategies =
        decode_elements(fields.remove("strategies"), "strategy", &mut state.skipped);

    state.analytics = match fields.remove("analytics") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<Analytics>(value) {
            Ok(analytics) => Some(analytics),
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable initial analytics");
                None
            }
        },
    };

    Ok(state)
}

fn typed<T: DeserializeOwned>(kind: EventKind, data: Value) -> Result<T, IngestionError> {
    serde_json::from_value(data).map_err(|e| IngestionError::InvalidPayload {
        kind,
        reason: e.to_string(),
    })
}

/// Decode each array element independently, skipping the ones that fail.
fn decode_elements<T: DeserializeOwned>(
    value: Option<Value>,
    label: &'static str,
    skipped: &mut usize,
) -> Vec<T> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(_) => {
            warn!(element = label, "Expected an array in initial state");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(decoded) => out.push(decoded),
            Err(e) => {
                *skipped += 1;
                warn!(element = label, index, error = %e, "Skipping malformed element");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ingester() -> (EventIngester, Arc<EngineMetrics>) {
        let metrics = Arc::new(EngineMetrics::new());
        (EventIngester::new(Arc::clone(&metrics)), metrics)
    }

    fn trade_json(id: &str) -> Value {
        json!({
            "dissemination_identifier": id,
            "action_type": "NEWT",
            "execution_timestamp": "2024-05-02T10:15:00",
            "instrument": "10Y",
            "notional_eur": 100000000.0
        })
    }

    #[test]
    fn test_new_trade_decoded() {
        let (ingester, metrics) = ingester();
        let raw = json!({"type": "new_trade", "data": trade_json("T1")}).to_string();
        match ingester.ingest(&raw).unwrap() {
            InboundEvent::NewTrade(trade) => {
                assert_eq!(trade.id().as_str(), "T1");
                assert_eq!(trade.instrument(), Some("10Y"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(metrics.export()["events_dropped"], 0);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let (ingester, metrics) = ingester();
        let err = ingester.ingest("{not json").unwrap_err();
        assert!(matches!(err, IngestionError::Malformed(_)));
        assert_eq!(metrics.export()["events_dropped"], 1);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let (ingester, _) = ingester();
        let err = ingester.ingest(r#"{"type":"heartbeat","data":{}}"#).unwrap_err();
        assert_eq!(err, IngestionError::UnknownKind("heartbeat".to_string()));
    }

    #[test]
    fn test_invalid_payload_rejected() {
        let (ingester, _) = ingester();
        let err = ingester
            .ingest(r#"{"type":"new_trade","data":{"action_type":"NEWT"}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            IngestionError::InvalidPayload {
                kind: EventKind::NewTrade,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_strings_become_absent() {
        let (ingester, metrics) = ingester();
        let mut data = trade_json("T1");
        data["notional_eur"] = json!("NaN");
        data["fixed_rate_leg1"] = json!("Infinity");
        let raw = json!({"type": "trade_updated", "data": data}).to_string();

        let InboundEvent::TradeUpdated(trade) = ingester.ingest(&raw).unwrap() else {
            panic!("expected trade_updated");
        };
        assert_eq!(trade.notional_eur, None);
        assert_eq!(trade.fixed_rate_leg1, None);
        assert_eq!(metrics.export()["leaves_sanitized"], 2);
    }

    #[test]
    fn test_bare_non_finite_literals_become_absent() {
        let (ingester, metrics) = ingester();
        let raw = r#"{"type":"new_trade","data":{"dissemination_identifier":"T1","action_type":"NEWT","execution_timestamp":"2024-05-02T10:15:00","notional_eur":NaN,"fixed_rate_leg1":1e400}}"#;

        let InboundEvent::NewTrade(trade) = ingester.ingest(raw).unwrap() else {
            panic!("expected new_trade");
        };
        assert_eq!(trade.notional_eur, None);
        assert_eq!(trade.fixed_rate_leg1, None);
        assert_eq!(metrics.export()["leaves_sanitized"], 2);
        assert_eq!(metrics.export()["events_dropped"], 0);
    }

    #[test]
    fn test_initial_state_skips_bad_elements() {
        let (ingester, _) = ingester();
        let raw = json!({
            "type": "initial_state",
            "data": {
                "trades": [trade_json("T1"), {"garbage": true}, trade_json("T2")],
                "strategies": [],
                "analytics": {"total_trades": 2, "total_notional_eur": 200.0}
            }
        })
        .to_string();

        let InboundEvent::InitialState(state) = ingester.ingest(&raw).unwrap() else {
            panic!("expected initial_state");
        };
        assert_eq!(state.trades.len(), 2);
        assert_eq!(state.skipped, 1);
        assert_eq!(state.analytics.map(|a| a.summary.total_trades), Some(2));
    }

    #[test]
    fn test_initial_state_requires_object() {
        let (ingester, _) = ingester();
        let err = ingester
            .ingest(r#"{"type":"initial_state","data":[1,2]}"#)
            .unwrap_err();
        assert!(matches!(err, IngestionError::InvalidPayload { .. }));
    }

    #[test]
    fn test_alert_and_analytics_update() {
        let (ingester, _) = ingester();
        let alert = json!({
            "type": "alert",
            "data": {
                "alert_id": "ALERT_1",
                "severity": "high",
                "timestamp": "2024-05-02T10:15:00Z",
                "message": "Large trade detected"
            }
        });
        assert!(matches!(
            ingester.ingest(&alert.to_string()).unwrap(),
            InboundEvent::Alert(_)
        ));

        let update = r#"{"type":"analytics_update","data":{"total_trades":7}}"#;
        let InboundEvent::AnalyticsUpdate(analytics) = ingester.ingest(update).unwrap() else {
            panic!("expected analytics_update");
        };
        assert_eq!(analytics.summary.total_trades, 7);
    }
}
