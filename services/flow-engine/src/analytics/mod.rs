//! Analytics engine
//!
//! Pure functions from a cache snapshot to derived market, flow and risk
//! metrics. Every function is total: empty input yields a zero-valued
//! structure, and no output field is ever NaN or infinite.
//!
//! # Sections
//! - `summary`: totals, top underlyings, hourly activity
//! - `curve`: per-instrument notional and average rate, curve spreads
//! - `flow`: action tallies, platform market share
//! - `risk`: DV01, concentration, notional buckets and percentiles
//! - `realtime`: trailing volumes, liquidity score, rate velocity
//! - `currency`: per-currency exposure, instrument × currency heatmap
//! - `strategy`: per-type notional, instrument usage, package split

pub mod currency;
pub mod curve;
pub mod flow;
pub mod realtime;
pub mod risk;
pub mod strategy;
pub mod summary;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use swap_types::numeric::finite;

use crate::config::EngineConfig;
use crate::pro_trader::{self, ProTraderView};
use crate::snapshot::CacheSnapshot;

pub use currency::{CurrencyExposure, CurrencyMetrics, HeatmapCell};
pub use curve::{CurveMetrics, InstrumentRow};
pub use flow::{FlowDirection, FlowMetrics, PlatformShare};
pub use realtime::RealtimeMetrics;
pub use risk::{NotionalBucket, Percentiles, RiskMetrics};
pub use strategy::{
    InstrumentPreference, InstrumentUsage, PackageVsCustom, StrategyMetrics, StrategyTypeNotional,
};
pub use summary::{HourlyCount, StrategyTypeCount, SummaryMetrics, UnderlyingVolume};

/// The full derived view.
///
/// Summary fields sit at the top level; each detailed section is absent
/// when its inputs are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    #[serde(flatten)]
    pub summary: SummaryMetrics,
    pub curve_metrics: Option<CurveMetrics>,
    pub flow_metrics: Option<FlowMetrics>,
    pub risk_metrics: Option<RiskMetrics>,
    pub realtime_metrics: Option<RealtimeMetrics>,
    pub currency_metrics: Option<CurrencyMetrics>,
    pub strategy_metrics: Option<StrategyMetrics>,
    pub pro_trader_metrics: Option<ProTraderView>,
}

/// Recompute every section from a snapshot.
pub fn compute(snapshot: &CacheSnapshot, config: &EngineConfig, now: DateTime<Utc>) -> Analytics {
    let trades = snapshot.trades.as_slice();
    let strategies = snapshot.strategies.as_slice();
    let alerts = snapshot.alerts.as_slice();
    let has_trades = !trades.is_empty();

    Analytics {
        summary: summary::summary_metrics(trades, strategies),
        curve_metrics: has_trades.then(|| curve::curve_metrics(trades)),
        flow_metrics: has_trades.then(|| flow::flow_metrics(trades)),
        risk_metrics: has_trades.then(|| risk::risk_metrics(trades)),
        realtime_metrics: (has_trades || !alerts.is_empty()).then(|| {
            realtime::realtime_metrics(trades, alerts, now, config.rate_velocity_min_elapsed)
        }),
        currency_metrics: has_trades.then(|| currency::currency_metrics(trades, config.heatmap_cap)),
        strategy_metrics: (!strategies.is_empty())
            .then(|| strategy::strategy_metrics(strategies, trades)),
        pro_trader_metrics: has_trades
            .then(|| pro_trader::aggregate(trades, &config.windows(), now)),
    }
}

/// Map a non-finite result to zero.
#[inline]
pub(crate) fn safe(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `part / whole`, zero when the whole is zero.
#[inline]
pub(crate) fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        safe(part / whole)
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; needs at least two values.
pub(crate) fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    finite(var.sqrt())
}

/// Whether `ts` falls inside the trailing window ending at `now`.
#[inline]
pub(crate) fn within(ts: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    ts > now - window
}
