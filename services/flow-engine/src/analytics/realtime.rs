//! Real-time activity metrics over trailing windows

use std::collections::{BTreeMap, HashMap};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use swap_types::alert::Alert;
use swap_types::numeric::{clamp_score, rate_to_percent};
use swap_types::trade::Trade;

use super::{safe, within};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeMetrics {
    pub volume_last_5min: f64,
    pub volume_last_15min: f64,
    pub volume_last_hour: f64,
    pub trades_last_5min: usize,
    pub trades_last_15min: usize,
    pub trades_last_hour: usize,
    /// Heuristic 0..=100.
    pub liquidity_score: f64,
    pub alert_count_last_hour: usize,
    /// bps per hour by instrument, over the last 60 minutes.
    pub rate_velocity: BTreeMap<String, f64>,
}

/// `clamp(0, 100, trades_5m × 6 + log10(volume_15m + 1) × 8)`
pub fn liquidity_score(trades_last_5min: usize, volume_last_15min: f64) -> f64 {
    let depth = (volume_last_15min.max(0.0) + 1.0).log10() * 8.0;
    clamp_score(trades_last_5min as f64 * 6.0 + depth)
}

pub fn realtime_metrics(
    trades: &[Trade],
    alerts: &[Alert],
    now: DateTime<Utc>,
    min_elapsed: StdDuration,
) -> RealtimeMetrics {
    let five = Duration::minutes(5);
    let fifteen = Duration::minutes(15);
    let hour = Duration::minutes(60);

    let mut m = RealtimeMetrics::default();
    // (timestamp, rate in percent) per instrument within the hour
    let mut prints: HashMap<&str, Vec<(DateTime<Utc>, f64)>> = HashMap::new();

    for trade in trades {
        let ts = trade.execution_timestamp;
        if !within(ts, now, hour) {
            continue;
        }
        let notional = trade.notional_eur_or_zero();
        m.volume_last_hour += notional;
        m.trades_last_hour += 1;
        if within(ts, now, fifteen) {
            m.volume_last_15min += notional;
            m.trades_last_15min += 1;
        }
        if within(ts, now, five) {
            m.volume_last_5min += notional;
            m.trades_last_5min += 1;
        }
        if let (Some(instrument), Some(rate)) = (trade.instrument(), trade.fixed_rate()) {
            prints
                .entry(instrument)
                .or_default()
                .push((ts, rate_to_percent(rate)));
        }
    }

    m.volume_last_5min = safe(m.volume_last_5min);
    m.volume_last_15min = safe(m.volume_last_15min);
    m.volume_last_hour = safe(m.volume_last_hour);
    m.liquidity_score = liquidity_score(m.trades_last_5min, m.volume_last_15min);
    m.alert_count_last_hour = alerts
        .iter()
        .filter(|a| within(a.timestamp, now, hour))
        .count();

    let floor_hours = min_elapsed.as_secs_f64() / 3600.0;
    for (instrument, mut series) in prints {
        if series.len() < 2 {
            continue;
        }
        series.sort_by_key(|(ts, _)| *ts);
        let (first_ts, first_rate) = series[0];
        let (last_ts, last_rate) = series[series.len() - 1];
        let elapsed_hours = ((last_ts - first_ts).num_milliseconds() as f64 / 3_600_000.0)
            .max(floor_hours);
        if elapsed_hours <= 0.0 {
            continue;
        }
        let change_bps = (last_rate - first_rate) * 100.0;
        m.rate_velocity
            .insert(instrument.to_string(), safe(change_bps / elapsed_hours));
    }

    m
}
