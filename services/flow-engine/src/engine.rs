//! Flow engine core
//!
//! Owns the three stores and the derived view, and applies inbound events
//! strictly in arrival order. A merge pass that reports a change rebuilds
//! the snapshot and recomputes analytics once; an unchanged merge does
//! nothing further.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use swap_types::alert::Alert;
use swap_types::ids::AlertId;
use swap_types::strategy::Strategy;
use swap_types::trade::Trade;
use tracing::{debug, info};

use crate::alerts::{AlertBuffer, AlertDetector};
use crate::analytics::{self, Analytics};
use crate::config::{ConfigError, EngineConfig};
use crate::events::{InboundEvent, InitialState};
use crate::fingerprint::Fingerprint;
use crate::ingestion::{EventIngester, IngestionError};
use crate::metrics::EngineMetrics;
use crate::snapshot::{CacheSnapshot, SnapshotBuilder};
use crate::strategy_store::StrategyStore;
use crate::trade_store::TradeStore;

/// Where the current analytics view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsSource {
    /// Nothing computed yet
    Empty,
    /// Recomputed from the stores
    Local,
    /// Adopted from an inbound precomputed payload
    Pushed,
}

/// Effect of one applied event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The visible view (stores or analytics) changed.
    pub changed: bool,
    /// Analytics were recomputed locally.
    pub recomputed: bool,
}

impl ApplyOutcome {
    const UNCHANGED: Self = Self {
        changed: false,
        recomputed: false,
    };
    const RECOMPUTED: Self = Self {
        changed: true,
        recomputed: true,
    };
    const REPLACED: Self = Self {
        changed: true,
        recomputed: false,
    };
}

/// Compact summary of the current view, one line per change in the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDigest {
    pub version: u64,
    pub checksum: String,
    pub trades: usize,
    pub strategies: usize,
    pub alerts: usize,
    pub total_notional_eur: f64,
    pub analytics_source: AnalyticsSource,
    pub newest_trade: Option<String>,
}

/// Single-threaded cache and analytics core.
pub struct FlowEngine {
    config: EngineConfig,
    ingester: EventIngester,
    trades: TradeStore,
    strategies: StrategyStore,
    alerts: AlertBuffer,
    detector: AlertDetector,
    snapshots: SnapshotBuilder,
    snapshot: CacheSnapshot,
    analytics: Analytics,
    analytics_source: AnalyticsSource,
    metrics: Arc<EngineMetrics>,
}

impl FlowEngine {
    /// Create an engine, rejecting invalid configurations.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            trade_capacity = config.trade_capacity,
            alert_capacity = config.alert_capacity,
            windows = ?config.windows(),
            derive_alerts = config.derive_large_trade_alerts,
            "FlowEngine initialized"
        );

        Ok(Self::build(config))
    }

    /// Create an engine with the default configuration.
    pub fn with_defaults() -> Self {
        Self::build(EngineConfig::default())
    }

    fn build(config: EngineConfig) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        Self {
            ingester: EventIngester::new(Arc::clone(&metrics)),
            trades: TradeStore::new(config.trade_capacity),
            strategies: StrategyStore::new(),
            alerts: AlertBuffer::new(config.alert_capacity),
            detector: AlertDetector::new(
                config.alert_thresholds.clone(),
                config.alert_dedup_window,
            ),
            snapshots: SnapshotBuilder::new(),
            snapshot: CacheSnapshot::empty(Utc::now()),
            analytics: Analytics::default(),
            analytics_source: AnalyticsSource::Empty,
            metrics,
            config,
        }
    }

    /// Decode and apply one raw stream message.
    ///
    /// A message that fails to decode is counted and returned as an error;
    /// the stores are untouched.
    pub fn apply_message(
        &mut self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<ApplyOutcome, IngestionError> {
        let event = self.ingester.ingest(raw)?;
        Ok(self.apply(event, now))
    }

    /// Apply one decoded event.
    pub fn apply(&mut self, event: InboundEvent, now: DateTime<Utc>) -> ApplyOutcome {
        self.metrics.record_event_processed();
        let label = event.event_type_label();

        let outcome = match event {
            InboundEvent::InitialState(state) => self.apply_initial_state(state, now),
            InboundEvent::NewTrade(trade) => self.apply_new_trade(trade, now),
            InboundEvent::TradeUpdated(trade) => {
                let changed = self.upsert_trade(trade);
                self.finish(changed, now)
            }
            InboundEvent::StrategyDetected(strategy) => self.apply_strategy(strategy, now),
            InboundEvent::Alert(alert) => {
                let changed = self.alerts.push(alert);
                self.finish(changed, now)
            }
            InboundEvent::AnalyticsUpdate(analytics) => self.adopt(*analytics),
        };

        debug!(
            event_type = label,
            changed = outcome.changed,
            recomputed = outcome.recomputed,
            "Event applied"
        );
        outcome
    }

    /// Remove one alert. Returns whether it was present.
    pub fn dismiss_alert(&mut self, id: &AlertId, now: DateTime<Utc>) -> bool {
        let removed = self.alerts.dismiss(id);
        if removed {
            self.rebuild(now);
        }
        removed
    }

    /// Remove every alert. Returns whether any were held.
    pub fn clear_alerts(&mut self, now: DateTime<Utc>) -> bool {
        if self.alerts.is_empty() {
            return false;
        }
        self.alerts.clear();
        self.rebuild(now);
        true
    }

    /// Empty every store and the derived view. Snapshot versions keep
    /// increasing across resets.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.trades.clear();
        self.strategies.clear();
        self.alerts.clear();
        self.detector.reset();
        self.snapshot = self.snapshots.build(
            Vec::new(),
            std::iter::empty::<Fingerprint>(),
            Vec::new(),
            std::iter::empty::<Fingerprint>(),
            Vec::new(),
            now,
        );
        self.analytics = Analytics::default();
        self.analytics_source = AnalyticsSource::Empty;
        info!(version = self.snapshot.version, "FlowEngine reset");
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The latest snapshot; rebuilt on every change.
    pub fn snapshot(&self) -> &CacheSnapshot {
        &self.snapshot
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn analytics_source(&self) -> AnalyticsSource {
        self.analytics_source
    }

    /// Trades, newest first.
    pub fn trades(&self) -> &[Trade] {
        &self.snapshot.trades
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.snapshot.strategies
    }

    /// Alerts, newest first.
    pub fn alerts(&self) -> &[Alert] {
        &self.snapshot.alerts
    }

    pub fn trade_store(&self) -> &TradeStore {
        &self.trades
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn digest(&self) -> ViewDigest {
        ViewDigest {
            version: self.snapshot.version,
            checksum: self.snapshot.checksum.clone(),
            trades: self.snapshot.trades.len(),
            strategies: self.snapshot.strategies.len(),
            alerts: self.snapshot.alerts.len(),
            total_notional_eur: self.analytics.summary.total_notional_eur,
            analytics_source: self.analytics_source,
            newest_trade: self
                .snapshot
                .trades
                .first()
                .map(|t| t.id().as_str().to_string()),
        }
    }

    fn apply_initial_state(&mut self, state: InitialState, now: DateTime<Utc>) -> ApplyOutcome {
        if state.skipped > 0 {
            self.metrics.record_elements_skipped(state.skipped as u64);
        }
        for trade in &state.trades {
            self.detector.mark_seen(trade.id());
        }

        let received = (state.trades.len(), state.strategies.len());
        let before = self.trades.evicted_total();
        let trades_changed = self.trades.upsert_batch(state.trades);
        self.metrics
            .record_evictions(self.trades.evicted_total().saturating_sub(before));
        let strategies_changed = self.strategies.upsert_batch(state.strategies);

        info!(
            trades = received.0,
            strategies = received.1,
            trades_changed,
            strategies_changed,
            held = self.trades.len(),
            "Initial state merged"
        );

        if trades_changed || strategies_changed {
            self.rebuild(now);
            return ApplyOutcome::RECOMPUTED;
        }
        match state.analytics {
            Some(analytics) => self.adopt(analytics),
            None => ApplyOutcome::UNCHANGED,
        }
    }

    fn apply_new_trade(&mut self, trade: Trade, now: DateTime<Utc>) -> ApplyOutcome {
        let id = trade.id().clone();
        let was_held = self.trades.contains(&id);
        let candidate = self.config.derive_large_trade_alerts.then(|| trade.clone());
        let trade_changed = self.upsert_trade(trade);

        let mut alert_added = false;
        // A trade evicted on arrival was never visible and never alerts
        if let Some(trade) = candidate.filter(|_| self.trades.contains(&id)) {
            if let Some(alert) = self.detector.classify_trade(&trade, now) {
                alert_added |= self.push_derived(alert);
            }
            if !was_held {
                if let Some(alert) = self.detector.check_volume_trend(&trade, now) {
                    alert_added |= self.push_derived(alert);
                }
            }
        }
        self.finish(trade_changed || alert_added, now)
    }

    fn apply_strategy(&mut self, strategy: Strategy, now: DateTime<Utc>) -> ApplyOutcome {
        let is_new = !self.strategies.contains(strategy.id());
        let alert = if self.config.derive_large_trade_alerts && is_new {
            self.detector.classify_strategy(&strategy, now)
        } else {
            None
        };
        let strategy_changed = self.strategies.upsert(strategy);
        let alert_added = alert.map_or(false, |a| self.push_derived(a));
        self.finish(strategy_changed || alert_added, now)
    }

    fn push_derived(&mut self, alert: Alert) -> bool {
        let added = self.alerts.push(alert);
        if added {
            self.metrics.record_alert_derived();
        }
        added
    }

    fn upsert_trade(&mut self, trade: Trade) -> bool {
        let before = self.trades.evicted_total();
        let changed = self.trades.upsert(trade);
        self.metrics
            .record_evictions(self.trades.evicted_total().saturating_sub(before));
        changed
    }

    fn finish(&mut self, changed: bool, now: DateTime<Utc>) -> ApplyOutcome {
        if changed {
            self.rebuild(now);
            ApplyOutcome::RECOMPUTED
        } else {
            ApplyOutcome::UNCHANGED
        }
    }

    fn adopt(&mut self, analytics: Analytics) -> ApplyOutcome {
        self.analytics = analytics;
        self.analytics_source = AnalyticsSource::Pushed;
        self.metrics.record_analytics_push();
        ApplyOutcome::REPLACED
    }

    /// Rebuild the snapshot from the stores and recompute analytics.
    fn rebuild(&mut self, now: DateTime<Utc>) {
        self.snapshot = self.snapshots.build(
            self.trades.snapshot(),
            self.trades.fingerprints(),
            self.strategies.snapshot(),
            self.strategies.fingerprints(),
            self.alerts.snapshot(),
            now,
        );

        let started = Instant::now();
        self.analytics = analytics::compute(&self.snapshot, &self.config, now);
        let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.analytics_source = AnalyticsSource::Local;
        self.metrics.record_recompute(elapsed);

        debug!(
            version = self.snapshot.version,
            trades = self.snapshot.trades.len(),
            recompute_ns = elapsed,
            "Analytics recomputed"
        );
    }
}
