//! Pro-trader window aggregator
//!
//! Market-making metrics over fixed trailing windows (10, 15, 20, 30 and 60
//! minutes by default), rebuilt from the trade list on every recompute.
//! Nothing is carried between recomputes; the cost is bounded by the trade
//! store capacity.
//!
//! Rates are normalised to percent before aggregation (a reported value with
//! magnitude above 1 is taken as already in percent). Dispersion proxies are
//! computed on the decimal rate so that × 10000 yields basis points.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use swap_types::numeric::{rate_to_percent, BP_IN_PERCENT};
use swap_types::trade::{ActionType, Trade};
use tracing::debug;

use crate::analytics::{mean, ratio, safe, sample_stddev};

/// Trades above this EUR notional count as large blocks in flow metrics.
const LARGE_BLOCK_FLOW: f64 = 500_000_000.0;
/// Trades above this EUR notional raise a LARGE_BLOCK pro alert.
const LARGE_BLOCK_ALERT: f64 = 5_000_000_000.0;
/// One side must exceed the other by this factor to be directional.
const DIRECTIONAL_RATIO: f64 = 1.2;
const TRADING_DAYS: f64 = 252.0;

/// (name, short leg, long leg)
const SPREADS: &[(&str, &str, &str)] = &[
    ("2Y-5Y", "2Y", "5Y"),
    ("5Y-10Y", "5Y", "10Y"),
    ("10Y-30Y", "10Y", "30Y"),
    ("2Y-10Y", "2Y", "10Y"),
    ("2Y-30Y", "2Y", "30Y"),
];

/// Typical absolute spread levels in bps; twice this is abnormal.
const TYPICAL_SPREADS: &[(&str, f64)] = &[("5Y-10Y", 25.0), ("10Y-30Y", 38.0), ("2Y-10Y", 50.0)];

/// Inferred order-flow pressure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pressure {
    /// Falling rates: receivers of fixed dominate.
    BuyPressure,
    /// Rising rates: payers of fixed dominate.
    SellPressure,
    #[default]
    Balanced,
}

/// Per-instrument rate and volume statistics in one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentDetail {
    #[serde(alias = "tenor")]
    pub instrument: String,
    /// Percent.
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub vwap: Option<f64>,
    pub last: Option<f64>,
    /// EUR.
    pub volume: f64,
    pub trade_count: usize,
    pub avg_trade_size: f64,
    /// Dispersion proxy in bps; needs two prints.
    pub bid_ask_spread: Option<f64>,
    /// Annualised, percent; needs two prints.
    pub volatility: Option<f64>,
    /// Not computed.
    pub price_impact: Option<f64>,
}

/// Mid-to-mid spread in bps; zero and unavailable when a leg is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadDetail {
    pub current: f64,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadMetrics {
    pub spread_2y_5y: SpreadDetail,
    pub spread_5y_10y: SpreadDetail,
    pub spread_10y_30y: SpreadDetail,
    pub spread_2y_10y: SpreadDetail,
    pub spread_2y_30y: SpreadDetail,
}

impl SpreadMetrics {
    /// Look a spread up by its display name (`"5Y-10Y"`).
    pub fn get(&self, name: &str) -> Option<&SpreadDetail> {
        match name {
            "2Y-5Y" => Some(&self.spread_2y_5y),
            "5Y-10Y" => Some(&self.spread_5y_10y),
            "10Y-30Y" => Some(&self.spread_10y_30y),
            "2Y-10Y" => Some(&self.spread_2y_10y),
            "2Y-30Y" => Some(&self.spread_2y_30y),
            _ => None,
        }
    }

    fn slot(&mut self, name: &str) -> Option<&mut SpreadDetail> {
        match name {
            "2Y-5Y" => Some(&mut self.spread_2y_5y),
            "5Y-10Y" => Some(&mut self.spread_5y_10y),
            "10Y-30Y" => Some(&mut self.spread_10y_30y),
            "2Y-10Y" => Some(&mut self.spread_2y_10y),
            "2Y-30Y" => Some(&mut self.spread_2y_30y),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProFlowMetrics {
    pub net_flow_direction: Pressure,
    /// 0..=100.
    pub flow_intensity: f64,
    /// Buy share of directional volume; 0.5 when there is none.
    pub buy_volume_ratio: f64,
    /// Highest-volume instrument, empty when the window is.
    pub dominant_instrument: String,
    pub new_trades_count: usize,
    pub large_block_count: usize,
    pub flow_by_instrument: BTreeMap<String, Pressure>,
}

impl Default for ProFlowMetrics {
    fn default() -> Self {
        Self {
            net_flow_direction: Pressure::Balanced,
            flow_intensity: 0.0,
            buy_volume_ratio: 0.5,
            dominant_instrument: String::new(),
            new_trades_count: 0,
            large_block_count: 0,
            flow_by_instrument: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityMetrics {
    /// Mean of the per-instrument volatilities that could be computed.
    pub realized_volatility: f64,
    pub volatility_by_instrument: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProAlertKind {
    LargeBlock,
    AbnormalSpread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProAlert {
    pub alert_id: String,
    pub alert_type: ProAlertKind,
    pub severity: ProSeverity,
    #[serde(default)]
    pub instrument: Option<String>,
    pub current_value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Everything computed for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProTraderMetrics {
    /// Minutes.
    pub time_window: u32,
    pub trade_count: usize,
    pub instrument_metrics: BTreeMap<String, InstrumentDetail>,
    pub spread_metrics: SpreadMetrics,
    pub flow_metrics: ProFlowMetrics,
    pub volatility_metrics: VolatilityMetrics,
    pub alerts: Vec<ProAlert>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentDelta {
    /// bps; zero unless both windows have a mid.
    pub mid_change: f64,
    /// Percent of the long-window volume.
    pub volume_change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowDelta {
    pub direction_change: bool,
    pub intensity_change: f64,
}

/// Shortest window compared with the longest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProTraderDelta {
    pub short_window: u32,
    pub long_window: u32,
    pub instrument_deltas: BTreeMap<String, InstrumentDelta>,
    /// bps; zero unless available in both windows.
    pub spread_deltas: BTreeMap<String, f64>,
    pub flow_delta: FlowDelta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProTraderView {
    /// Ascending by window length.
    pub windows: Vec<ProTraderMetrics>,
    /// Absent with fewer than two windows.
    pub deltas: Option<ProTraderDelta>,
}

impl ProTraderView {
    pub fn window(&self, minutes: u32) -> Option<&ProTraderMetrics> {
        self.windows.iter().find(|w| w.time_window == minutes)
    }
}

/// One rate print used by the instrument statistics.
struct Print {
    at: DateTime<Utc>,
    percent: f64,
    notional: f64,
}

/// Compute every window and the short/long deltas. `windows` must be
/// sorted ascending.
pub fn aggregate(trades: &[Trade], windows: &[u32], now: DateTime<Utc>) -> ProTraderView {
    let metrics: Vec<ProTraderMetrics> = windows
        .iter()
        .map(|&w| window_metrics(trades, w, now))
        .collect();

    let deltas = match (metrics.first(), metrics.last()) {
        (Some(short), Some(long)) if metrics.len() > 1 => Some(compute_deltas(short, long)),
        _ => None,
    };

    ProTraderView {
        windows: metrics,
        deltas,
    }
}

/// Metrics over trades executed at or after `now - window_minutes`.
pub fn window_metrics(trades: &[Trade], window_minutes: u32, now: DateTime<Utc>) -> ProTraderMetrics {
    let cutoff = now - Duration::minutes(i64::from(window_minutes));
    let in_window: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.execution_timestamp >= cutoff)
        .collect();

    let mut prints: HashMap<&str, Vec<Print>> = HashMap::new();
    for trade in &in_window {
        let (Some(instrument), Some(rate)) = (trade.instrument(), trade.fixed_rate()) else {
            continue;
        };
        prints.entry(instrument).or_default().push(Print {
            at: trade.execution_timestamp,
            percent: rate_to_percent(rate),
            notional: trade.notional_eur_or_zero(),
        });
    }
    for series in prints.values_mut() {
        series.sort_by_key(|p| p.at);
    }

    let instrument_metrics: BTreeMap<String, InstrumentDetail> = prints
        .iter()
        .map(|(instrument, series)| (instrument.to_string(), instrument_detail(instrument, series)))
        .collect();

    let spread_metrics = spread_metrics(&instrument_metrics);
    let flow_metrics = flow_metrics(&in_window, &prints);
    let volatility_metrics = volatility_metrics(&instrument_metrics);
    let alerts = detect_alerts(&in_window, &spread_metrics, now);

    debug!(
        window = window_minutes,
        trades = in_window.len(),
        instruments = instrument_metrics.len(),
        "Pro-trader window computed"
    );

    ProTraderMetrics {
        time_window: window_minutes,
        trade_count: in_window.len(),
        instrument_metrics,
        spread_metrics,
        flow_metrics,
        volatility_metrics,
        alerts,
    }
}

fn instrument_detail(instrument: &str, series: &[Print]) -> InstrumentDetail {
    let rates: Vec<f64> = series.iter().map(|p| p.percent).collect();
    let volume: f64 = series.iter().map(|p| p.notional).sum();
    let weighted: f64 = series.iter().map(|p| p.percent * p.notional).sum();

    let high = rates.iter().copied().reduce(f64::max);
    let low = rates.iter().copied().reduce(f64::min);
    let decimals: Vec<f64> = rates.iter().map(|r| r / 100.0).collect();
    let stddev = sample_stddev(&decimals);

    InstrumentDetail {
        instrument: instrument.to_string(),
        high,
        low,
        mid: mean(&rates),
        vwap: (volume != 0.0).then(|| safe(weighted / volume)),
        last: series.last().map(|p| p.percent),
        volume: safe(volume),
        trade_count: series.len(),
        avg_trade_size: ratio(volume, series.len() as f64),
        bid_ask_spread: stddev.map(|sd| safe(sd * 10_000.0)),
        volatility: stddev.map(|sd| safe(sd * TRADING_DAYS.sqrt() * 100.0)),
        price_impact: None,
    }
}

fn spread_metrics(details: &BTreeMap<String, InstrumentDetail>) -> SpreadMetrics {
    let mid = |instrument: &str| details.get(instrument).and_then(|d| d.mid);
    let mut out = SpreadMetrics::default();
    for (name, short, long) in SPREADS {
        if let (Some(m1), Some(m2), Some(slot)) = (mid(short), mid(long), out.slot(name)) {
            *slot = SpreadDetail {
                current: safe((m2 - m1) * 100.0),
                available: true,
            };
        }
    }
    out
}

fn flow_metrics(in_window: &[&Trade], prints: &HashMap<&str, Vec<Print>>) -> ProFlowMetrics {
    let mut out = ProFlowMetrics::default();
    if in_window.is_empty() {
        return out;
    }

    for trade in in_window {
        if trade.action_type == ActionType::New {
            out.new_trades_count += 1;
        }
        if trade.notional_eur_or_zero() > LARGE_BLOCK_FLOW {
            out.large_block_count += 1;
        }
    }

    let mut buy = 0.0;
    let mut sell = 0.0;
    let mut dominant: Option<(&str, f64)> = None;

    // Sorted keys keep the dominant-instrument tie-break stable
    let instruments: BTreeSet<&str> = prints.keys().copied().collect();
    for instrument in instruments {
        let Some(series) = prints.get(instrument) else {
            continue;
        };
        let volume: f64 = series.iter().map(|p| p.notional).sum();

        let pressure = match (series.first(), series.last()) {
            (Some(first), Some(last)) if series.len() > 1 => {
                let change = last.percent - first.percent;
                if change < -BP_IN_PERCENT {
                    Pressure::BuyPressure
                } else if change > BP_IN_PERCENT {
                    Pressure::SellPressure
                } else {
                    Pressure::Balanced
                }
            }
            _ => Pressure::Balanced,
        };
        match pressure {
            Pressure::BuyPressure => buy += volume,
            Pressure::SellPressure => sell += volume,
            Pressure::Balanced => {}
        }
        out.flow_by_instrument.insert(instrument.to_string(), pressure);

        if dominant.map_or(true, |(_, best)| volume > best) {
            dominant = Some((instrument, volume));
        }
    }

    let directional = buy + sell;
    out.buy_volume_ratio = if directional > 0.0 {
        safe(buy / directional)
    } else {
        0.5
    };
    out.net_flow_direction = if buy > sell * DIRECTIONAL_RATIO {
        Pressure::BuyPressure
    } else if sell > buy * DIRECTIONAL_RATIO {
        Pressure::SellPressure
    } else {
        Pressure::Balanced
    };
    out.flow_intensity = safe(((buy - sell).abs() / directional.max(1.0) * 100.0).min(100.0));
    out.dominant_instrument = dominant.map(|(i, _)| i.to_string()).unwrap_or_default();
    out
}

fn volatility_metrics(details: &BTreeMap<String, InstrumentDetail>) -> VolatilityMetrics {
    let vols: Vec<f64> = details.values().filter_map(|d| d.volatility).collect();
    VolatilityMetrics {
        realized_volatility: mean(&vols).unwrap_or(0.0),
        volatility_by_instrument: details
            .iter()
            .map(|(k, d)| (k.clone(), d.volatility.unwrap_or(0.0)))
            .collect(),
    }
}

fn detect_alerts(in_window: &[&Trade], spreads: &SpreadMetrics, now: DateTime<Utc>) -> Vec<ProAlert> {
    let mut alerts = Vec::new();

    for trade in in_window {
        let notional = trade.notional_eur_or_zero();
        if notional <= LARGE_BLOCK_ALERT {
            continue;
        }
        let instrument = trade.instrument().map(str::to_string);
        alerts.push(ProAlert {
            alert_id: format!("large_block_{}", trade.id()),
            alert_type: ProAlertKind::LargeBlock,
            severity: ProSeverity::High,
            message: format!(
                "Large block trade detected: {:.2}B EUR in {}",
                notional / 1_000_000_000.0,
                instrument.as_deref().unwrap_or("unknown instrument")
            ),
            instrument,
            current_value: notional,
            threshold: LARGE_BLOCK_ALERT,
            timestamp: now,
        });
    }

    for (name, typical) in TYPICAL_SPREADS {
        let Some(detail) = spreads.get(name) else {
            continue;
        };
        let threshold = typical * 2.0;
        if !detail.available || detail.current.abs() <= threshold {
            continue;
        }
        alerts.push(ProAlert {
            alert_id: format!("abnormal_spread_{}_{}", name, now.timestamp_millis()),
            alert_type: ProAlertKind::AbnormalSpread,
            severity: ProSeverity::Medium,
            instrument: None,
            current_value: detail.current,
            threshold,
            timestamp: now,
            message: format!(
                "Abnormal spread detected: {} at {:.2} bps (typical: {:.2} bps)",
                name, detail.current, typical
            ),
        });
    }

    alerts
}

/// Compare the shortest window with the longest.
pub fn compute_deltas(short: &ProTraderMetrics, long: &ProTraderMetrics) -> ProTraderDelta {
    let names: BTreeSet<&String> = short
        .instrument_metrics
        .keys()
        .chain(long.instrument_metrics.keys())
        .collect();

    let instrument_deltas = names
        .into_iter()
        .map(|name| {
            let s = short.instrument_metrics.get(name);
            let l = long.instrument_metrics.get(name);
            let mid_change = match (s.and_then(|d| d.mid), l.and_then(|d| d.mid)) {
                (Some(a), Some(b)) => safe((a - b) * 100.0),
                _ => 0.0,
            };
            let sv = s.map_or(0.0, |d| d.volume);
            let lv = l.map_or(0.0, |d| d.volume);
            let delta = InstrumentDelta {
                mid_change,
                volume_change: if lv > 0.0 {
                    safe((sv - lv) / lv * 100.0)
                } else {
                    0.0
                },
            };
            (name.clone(), delta)
        })
        .collect();

    let spread_deltas = SPREADS
        .iter()
        .map(|(name, _, _)| {
            let change = match (short.spread_metrics.get(name), long.spread_metrics.get(name)) {
                (Some(a), Some(b)) if a.available && b.available => safe(a.current - b.current),
                _ => 0.0,
            };
            (name.to_string(), change)
        })
        .collect();

    ProTraderDelta {
        short_window: short.time_window,
        long_window: long.time_window,
        instrument_deltas,
        spread_deltas,
        flow_delta: FlowDelta {
            direction_change: short.flow_metrics.net_flow_direction
                != long.flow_metrics.net_flow_direction,
            intensity_change: safe(
                short.flow_metrics.flow_intensity - long.flow_metrics.flow_intensity,
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use swap_types::ids::TradeId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    fn trade(id: &str, minutes_ago: i64, instrument: &str, rate: f64, notional: f64) -> Trade {
        Trade::new(
            TradeId::new(id),
            ActionType::New,
            now() - Duration::minutes(minutes_ago),
        )
        .with_instrument(instrument)
        .with_fixed_rate(rate)
        .with_notional_eur(notional)
    }

    const WINDOWS: &[u32] = &[10, 15, 20, 30, 60];

    #[test]
    fn test_empty_windows_are_fully_populated() {
        let view = aggregate(&[], WINDOWS, now());
        assert_eq!(view.windows.len(), 5);
        for w in &view.windows {
            assert_eq!(w.trade_count, 0);
            assert!(w.instrument_metrics.is_empty());
            assert_eq!(w.flow_metrics, ProFlowMetrics::default());
            assert_eq!(w.flow_metrics.buy_volume_ratio, 0.5);
            assert!(!w.spread_metrics.spread_2y_10y.available);
            assert_eq!(w.volatility_metrics.realized_volatility, 0.0);
        }
        let deltas = view.deltas.unwrap();
        assert_eq!((deltas.short_window, deltas.long_window), (10, 60));
        assert!(!deltas.flow_delta.direction_change);
    }

    #[test]
    fn test_window_filter_is_inclusive() {
        let trades = vec![
            trade("A", 10, "10Y", 0.03, 1.0),
            trade("B", 11, "10Y", 0.03, 1.0),
        ];
        let m = window_metrics(&trades, 10, now());
        assert_eq!(m.trade_count, 1);
    }

    #[test]
    fn test_instrument_levels_in_percent() {
        let trades = vec![
            trade("A", 5, "10Y", 0.0300, 100.0),
            trade("B", 3, "10Y", 2.9, 300.0),
            trade("C", 1, "10Y", 0.0310, 100.0),
        ];
        let d = &window_metrics(&trades, 10, now()).instrument_metrics["10Y"];
        assert!((d.high.unwrap() - 3.1).abs() < 1e-9);
        assert!((d.low.unwrap() - 2.9).abs() < 1e-9);
        assert!((d.mid.unwrap() - 3.0).abs() < 1e-9);
        // (3.0×100 + 2.9×300 + 3.1×100) / 500
        assert!((d.vwap.unwrap() - 2.96).abs() < 1e-9);
        assert!((d.last.unwrap() - 3.1).abs() < 1e-9);
        assert_eq!(d.trade_count, 3);
        assert_eq!(d.volume, 500.0);
        // stddev of decimals 0.030/0.029/0.031 is 0.001
        assert!((d.bid_ask_spread.unwrap() - 10.0).abs() < 1e-6);
        assert!((d.volatility.unwrap() - 0.1 * 252f64.sqrt()).abs() < 1e-6);
        assert_eq!(d.price_impact, None);
    }

    #[test]
    fn test_single_print_has_no_dispersion() {
        let trades = vec![trade("A", 1, "5Y", 0.025, 10.0)];
        let d = &window_metrics(&trades, 10, now()).instrument_metrics["5Y"];
        assert_eq!(d.bid_ask_spread, None);
        assert_eq!(d.volatility, None);
    }

    #[test]
    fn test_spreads_mid_to_mid_in_bps() {
        let trades = vec![
            trade("A", 1, "2Y", 0.0250, 1.0),
            trade("B", 1, "10Y", 0.0290, 1.0),
        ];
        let s = window_metrics(&trades, 10, now()).spread_metrics;
        assert!(s.spread_2y_10y.available);
        assert!((s.spread_2y_10y.current - 40.0).abs() < 1e-9);
        assert!(!s.spread_5y_10y.available);
        assert_eq!(s.spread_5y_10y.current, 0.0);
    }

    #[test]
    fn test_flow_pressure_from_rate_moves() {
        let trades = vec![
            // 10Y falls 5bp: buy pressure on 600
            trade("A", 8, "10Y", 0.0300, 300.0),
            trade("B", 2, "10Y", 0.0295, 300.0),
            // 2Y rises 0.5bp: balanced
            trade("C", 8, "2Y", 0.0250, 100.0),
            trade("D", 2, "2Y", 0.02505, 100.0),
        ];
        let f = window_metrics(&trades, 10, now()).flow_metrics;
        assert_eq!(f.flow_by_instrument["10Y"], Pressure::BuyPressure);
        assert_eq!(f.flow_by_instrument["2Y"], Pressure::Balanced);
        assert_eq!(f.net_flow_direction, Pressure::BuyPressure);
        assert_eq!(f.buy_volume_ratio, 1.0);
        assert_eq!(f.flow_intensity, 100.0);
        assert_eq!(f.dominant_instrument, "10Y");
        assert_eq!(f.new_trades_count, 4);
    }

    #[test]
    fn test_near_equal_sides_are_balanced() {
        let trades = vec![
            trade("A", 8, "10Y", 0.0300, 110.0),
            trade("B", 2, "10Y", 0.0290, 0.0),
            trade("C", 8, "5Y", 0.0200, 100.0),
            trade("D", 2, "5Y", 0.0210, 0.0),
        ];
        let f = window_metrics(&trades, 10, now()).flow_metrics;
        assert_eq!(f.net_flow_direction, Pressure::Balanced);
        assert!((f.flow_intensity - 10.0 / 210.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_instrument_tie_prefers_smaller_name() {
        let trades = vec![
            trade("A", 1, "5Y", 0.02, 100.0),
            trade("B", 1, "10Y", 0.03, 100.0),
        ];
        let f = window_metrics(&trades, 10, now()).flow_metrics;
        assert_eq!(f.dominant_instrument, "10Y");
    }

    #[test]
    fn test_large_block_counts_and_alerts() {
        let trades = vec![
            trade("A", 1, "10Y", 0.03, 600_000_000.0),
            trade("B", 1, "30Y", 0.03, 6_000_000_000.0),
        ];
        let m = window_metrics(&trades, 10, now());
        assert_eq!(m.flow_metrics.large_block_count, 2);
        assert_eq!(m.alerts.len(), 1);
        let alert = &m.alerts[0];
        assert_eq!(alert.alert_type, ProAlertKind::LargeBlock);
        assert_eq!(alert.alert_id, "large_block_B");
        assert_eq!(alert.message, "Large block trade detected: 6.00B EUR in 30Y");
    }

    #[test]
    fn test_abnormal_spread_alert() {
        let trades = vec![
            trade("A", 1, "5Y", 0.0200, 1.0),
            trade("B", 1, "10Y", 0.0260, 1.0),
        ];
        let m = window_metrics(&trades, 10, now());
        // 60bp > 2 × 25bp
        assert!(m
            .alerts
            .iter()
            .any(|a| a.alert_type == ProAlertKind::AbnormalSpread && a.threshold == 50.0));
    }

    #[test]
    fn test_deltas_short_vs_long() {
        let trades = vec![
            trade("A", 5, "10Y", 0.0300, 100.0),
            trade("B", 45, "10Y", 0.0280, 100.0),
        ];
        let view = aggregate(&trades, WINDOWS, now());
        let d = view.deltas.unwrap();
        let ten = &d.instrument_deltas["10Y"];
        // short mid 3.00, long mid 2.90
        assert!((ten.mid_change - 10.0).abs() < 1e-9);
        assert!((ten.volume_change - -50.0).abs() < 1e-9);
        assert_eq!(d.spread_deltas["5Y-10Y"], 0.0);
        assert_eq!(d.spread_deltas.len(), 5);
    }

    #[test]
    fn test_single_window_has_no_deltas() {
        let view = aggregate(&[], &[30], now());
        assert_eq!(view.windows.len(), 1);
        assert!(view.deltas.is_none());
        assert!(view.window(30).is_some());
    }
}
