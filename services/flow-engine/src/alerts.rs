//! Alert ring buffer and local alert derivation

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use swap_types::alert::{Alert, Severity};
use swap_types::ids::{AlertId, StrategyId, TradeId};
use swap_types::strategy::Strategy;
use swap_types::trade::{ActionType, Trade};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AlertThresholds;

/// Bounded, newest-first list of alerts.
#[derive(Debug)]
pub struct AlertBuffer {
    alerts: VecDeque<Alert>,
    capacity: usize,
}

impl AlertBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend an alert and trim to capacity.
    ///
    /// Returns `false` when an alert with the same id is already held.
    pub fn push(&mut self, mut alert: Alert) -> bool {
        if self.alerts.iter().any(|a| a.alert_id == alert.alert_id) {
            debug!(alert_id = %alert.alert_id, "Duplicate alert ignored");
            return false;
        }
        alert.sanitize();
        self.alerts.push_front(alert);
        self.alerts.truncate(self.capacity);
        true
    }

    /// Remove one alert by id. Returns whether it was present.
    pub fn dismiss(&mut self, id: &AlertId) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| &a.alert_id != id);
        before != self.alerts.len()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> + '_ {
        self.alerts.iter()
    }

    pub fn snapshot(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Format a EUR notional as `2.50B`, `750.00M` or `12,345`.
pub fn format_notional(notional: f64) -> String {
    if notional >= 1_000_000_000.0 {
        format!("{:.2}B", notional / 1_000_000_000.0)
    } else if notional >= 1_000_000.0 {
        format!("{:.2}M", notional / 1_000_000.0)
    } else {
        let whole = notional.max(0.0).round() as u64;
        let digits = whole.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

/// `ALERT_` followed by eight upper-case hex digits.
fn next_alert_id() -> AlertId {
    let hex = Uuid::now_v7().simple().to_string().to_ascii_uppercase();
    // Leading v7 digits are the millisecond clock; use the random tail
    let tail = &hex[hex.len() - 8..];
    AlertId::new(format!("ALERT_{tail}"))
}

/// Trailing window summed by the volume-trend rule.
const TREND_WINDOW_MINUTES: i64 = 5;
/// Minimum spacing between two volume-trend alerts.
const TREND_COOLDOWN_MINUTES: i64 = 5;

/// Derives local alerts: large trades, large strategy packages and
/// trailing-volume spikes.
///
/// Each trade id and strategy id alerts at most once while it stays in the
/// bounded dedup window.
#[derive(Debug)]
pub struct AlertDetector {
    thresholds: AlertThresholds,
    seen: HashSet<TradeId>,
    seen_order: VecDeque<TradeId>,
    alerted_strategies: HashSet<StrategyId>,
    alerted_strategy_order: VecDeque<StrategyId>,
    window: usize,
    /// (execution time, notional) of recent new trades, oldest first.
    volume_history: VecDeque<(DateTime<Utc>, f64)>,
    last_trend_alert: Option<DateTime<Utc>>,
}

impl AlertDetector {
    pub fn new(thresholds: AlertThresholds, window: usize) -> Self {
        Self {
            thresholds,
            seen: HashSet::new(),
            seen_order: VecDeque::new(),
            alerted_strategies: HashSet::new(),
            alerted_strategy_order: VecDeque::new(),
            window,
            volume_history: VecDeque::new(),
            last_trend_alert: None,
        }
    }

    /// Classify a trade, returning an alert when it crosses a threshold.
    ///
    /// Only NEWT trades are considered. Every classified id is remembered,
    /// whether or not it alerted, until it falls out of the dedup window.
    pub fn classify_trade(&mut self, trade: &Trade, now: DateTime<Utc>) -> Option<Alert> {
        if trade.action_type != ActionType::New || self.seen.contains(trade.id()) {
            return None;
        }
        let notional = trade.notional_eur.filter(|v| v.is_finite())?;
        self.remember(trade.id().clone());

        let severity = self.thresholds.classify(notional)?;
        let mut alert = Alert::new(
            next_alert_id(),
            severity,
            now,
            format!("Large trade detected: {} EUR", format_notional(notional)),
        );
        alert.alert_type = Some("LargeTrade".to_string());
        alert.trade_id = Some(trade.id().clone());
        alert.notional_eur = Some(notional);

        info!(
            trade_id = %trade.id(),
            severity = %severity,
            notional_eur = notional,
            "Large trade alert derived"
        );
        Some(alert)
    }

    /// Grade a newly detected strategy package by its total notional.
    ///
    /// Only strategies that crossed a threshold are remembered, so a
    /// package that later grows past one can still alert once.
    pub fn classify_strategy(
        &mut self,
        strategy: &Strategy,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        if self.alerted_strategies.contains(strategy.id()) {
            return None;
        }
        let notional = strategy.total_notional_eur.filter(|v| v.is_finite())?;
        let severity = self.thresholds.classify(notional)?;
        self.remember_strategy(strategy.id().clone());

        let mut alert = Alert::new(
            next_alert_id(),
            severity,
            now,
            format!(
                "Large strategy package: {} - {} EUR",
                strategy.strategy_type,
                format_notional(notional)
            ),
        );
        alert.alert_type = Some("StrategyPackage".to_string());
        alert.strategy_id = Some(strategy.id().clone());
        alert.notional_eur = Some(notional);

        info!(
            strategy_id = %strategy.id(),
            strategy_type = %strategy.strategy_type,
            severity = %severity,
            notional_eur = notional,
            "Strategy package alert derived"
        );
        Some(alert)
    }

    /// Add a newly held trade to the volume history and check the trailing
    /// window against the trend threshold.
    pub fn check_volume_trend(&mut self, trade: &Trade, now: DateTime<Utc>) -> Option<Alert> {
        if let Some(notional) = trade.notional_eur.filter(|v| v.is_finite() && *v > 0.0) {
            self.volume_history
                .push_back((trade.execution_timestamp, notional));
        }

        let cutoff = now - Duration::minutes(TREND_WINDOW_MINUTES);
        self.volume_history.retain(|(ts, _)| *ts > cutoff);
        let volume: f64 = self.volume_history.iter().map(|(_, v)| v).sum();
        if volume <= self.thresholds.trend_volume {
            return None;
        }

        let cooldown = Duration::minutes(TREND_COOLDOWN_MINUTES);
        if self.last_trend_alert.map_or(false, |last| now - last < cooldown) {
            debug!(volume_eur = volume, "Volume trend alert suppressed by cooldown");
            return None;
        }
        self.last_trend_alert = Some(now);

        let mut alert = Alert::new(
            next_alert_id(),
            Severity::High,
            now,
            format!(
                "High volume trend: {} EUR in last {TREND_WINDOW_MINUTES} minutes",
                format_notional(volume)
            ),
        );
        alert.alert_type = Some("Trend".to_string());
        alert.notional_eur = Some(volume);

        info!(volume_eur = volume, "Volume trend alert derived");
        Some(alert)
    }

    /// Remember a trade without alerting on it (trades loaded from a snapshot).
    pub fn mark_seen(&mut self, id: &TradeId) {
        self.remember(id.clone());
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.seen_order.clear();
        self.alerted_strategies.clear();
        self.alerted_strategy_order.clear();
        self.volume_history.clear();
        self.last_trend_alert = None;
    }

    fn remember(&mut self, id: TradeId) {
        remember_bounded(&mut self.seen, &mut self.seen_order, id, self.window);
    }

    fn remember_strategy(&mut self, id: StrategyId) {
        remember_bounded(
            &mut self.alerted_strategies,
            &mut self.alerted_strategy_order,
            id,
            self.window,
        );
    }
}

fn remember_bounded<T>(set: &mut HashSet<T>, order: &mut VecDeque<T>, id: T, window: usize)
where
    T: Clone + Eq + std::hash::Hash,
{
    if set.insert(id.clone()) {
        order.push_back(id);
    }
    while order.len() > window {
        if let Some(old) = order.pop_front() {
            set.remove(&old);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()
    }

    fn alert(id: &str) -> Alert {
        Alert::new(AlertId::new(id), Severity::High, now(), "test")
    }

    fn big_trade(id: &str, notional: f64) -> Trade {
        Trade::new(TradeId::new(id), ActionType::New, now()).with_notional_eur(notional)
    }

    #[test]
    fn test_push_is_newest_first_and_bounded() {
        let mut buf = AlertBuffer::new(3);
        for i in 0..5 {
            assert!(buf.push(alert(&format!("A{i}"))));
        }
        let ids: Vec<_> = buf.iter().map(|a| a.alert_id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["A4", "A3", "A2"]);
    }

    #[test]
    fn test_duplicate_id_ignored() {
        let mut buf = AlertBuffer::new(10);
        assert!(buf.push(alert("A")));
        assert!(!buf.push(alert("A")));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_dismiss_and_clear() {
        let mut buf = AlertBuffer::new(10);
        buf.push(alert("A"));
        buf.push(alert("B"));
        assert!(buf.dismiss(&AlertId::new("A")));
        assert!(!buf.dismiss(&AlertId::new("A")));
        assert_eq!(buf.len(), 1);
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_format_notional() {
        assert_eq!(format_notional(2_500_000_000.0), "2.50B");
        assert_eq!(format_notional(750_000_000.0), "750.00M");
        assert_eq!(format_notional(12_345.0), "12,345");
        assert_eq!(format_notional(999.0), "999");
    }

    #[test]
    fn test_large_trade_classification() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        let alert = detector
            .classify_trade(&big_trade("T1", 2_500_000_000.0), now())
            .unwrap();
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.alert_type.as_deref(), Some("LargeTrade"));
        assert_eq!(alert.trade_id, Some(TradeId::new("T1")));
        assert_eq!(alert.message, "Large trade detected: 2.50B EUR");

        let id = alert.alert_id.as_str();
        assert!(id.starts_with("ALERT_"));
        assert_eq!(id.len(), 14);
        assert!(id[6..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_each_trade_alerts_once() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        let trade = big_trade("T1", 600_000_000.0);
        assert!(detector.classify_trade(&trade, now()).is_some());
        assert!(detector.classify_trade(&trade, now()).is_none());
    }

    #[test]
    fn test_small_and_non_new_trades_do_not_alert() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        assert!(detector
            .classify_trade(&big_trade("T1", 10_000_000.0), now())
            .is_none());

        let mut modified = big_trade("T2", 3_000_000_000.0);
        modified.action_type = ActionType::Modify;
        assert!(detector.classify_trade(&modified, now()).is_none());
    }

    #[test]
    fn test_marked_trades_never_alert() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        detector.mark_seen(&TradeId::new("T1"));
        assert!(detector
            .classify_trade(&big_trade("T1", 3_000_000_000.0), now())
            .is_none());
    }

    #[test]
    fn test_dedup_window_is_bounded() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 2);
        for id in ["T1", "T2", "T3"] {
            detector.classify_trade(&big_trade(id, 600_000_000.0), now());
        }
        assert_eq!(detector.seen.len(), 2);
        // T1 fell out of the window
        assert!(detector
            .classify_trade(&big_trade("T1", 600_000_000.0), now())
            .is_some());
    }

    fn strategy(id: &str, notional: f64) -> Strategy {
        Strategy::new(
            StrategyId::new(id),
            "Butterfly",
            vec![TradeId::new("L1"), TradeId::new("L2"), TradeId::new("L3")],
            now(),
            now(),
        )
        .with_total_notional(notional)
    }

    fn trade_at(id: &str, minutes_ago: i64, notional: f64) -> Trade {
        Trade::new(
            TradeId::new(id),
            ActionType::New,
            now() - Duration::minutes(minutes_ago),
        )
        .with_notional_eur(notional)
    }

    #[test]
    fn test_strategy_package_graded_and_alerts_once() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        let alert = detector
            .classify_strategy(&strategy("S1", 1_200_000_000.0), now())
            .unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type.as_deref(), Some("StrategyPackage"));
        assert_eq!(alert.strategy_id, Some(StrategyId::new("S1")));
        assert_eq!(alert.message, "Large strategy package: Butterfly - 1.20B EUR");

        assert!(detector
            .classify_strategy(&strategy("S1", 3_000_000_000.0), now())
            .is_none());
    }

    #[test]
    fn test_small_strategy_can_alert_after_growing() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        assert!(detector
            .classify_strategy(&strategy("S1", 100_000_000.0), now())
            .is_none());
        let alert = detector
            .classify_strategy(&strategy("S1", 2_000_000_000.0), now())
            .unwrap();
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_volume_trend_fires_above_threshold() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        assert!(detector
            .check_volume_trend(&trade_at("T1", 1, 3_000_000_000.0), now())
            .is_none());
        let alert = detector
            .check_volume_trend(&trade_at("T2", 2, 2_500_000_000.0), now())
            .unwrap();
        assert_eq!(alert.alert_type.as_deref(), Some("Trend"));
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.notional_eur, Some(5_500_000_000.0));
        assert_eq!(alert.message, "High volume trend: 5.50B EUR in last 5 minutes");
    }

    #[test]
    fn test_volume_trend_ignores_old_trades() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        detector.check_volume_trend(&trade_at("T1", 10, 4_000_000_000.0), now());
        assert!(detector
            .check_volume_trend(&trade_at("T2", 1, 4_000_000_000.0), now())
            .is_none());
        assert_eq!(detector.volume_history.len(), 1);
    }

    #[test]
    fn test_volume_trend_cooldown() {
        let mut detector = AlertDetector::new(AlertThresholds::default(), 100);
        assert!(detector
            .check_volume_trend(&trade_at("T1", 0, 6_000_000_000.0), now())
            .is_some());
        let soon = now() + Duration::minutes(2);
        assert!(detector
            .check_volume_trend(&trade_at("T2", -2, 6_000_000_000.0), soon)
            .is_none());
        let later = now() + Duration::minutes(5);
        assert!(detector
            .check_volume_trend(&trade_at("T3", -5, 6_000_000_000.0), later)
            .is_some());
    }
}
