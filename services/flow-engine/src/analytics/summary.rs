//! Headline totals for the whole cache

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use swap_types::strategy::Strategy;
use swap_types::trade::Trade;

use super::{ratio, safe};

const TOP_UNDERLYINGS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderlyingVolume {
    pub name: String,
    pub notional: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyCount {
    /// `YYYY-MM-DDTHH:00`
    pub hour: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTypeCount {
    #[serde(rename = "type")]
    pub strategy_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryMetrics {
    pub total_trades: usize,
    pub total_notional_eur: f64,
    pub avg_size_eur: f64,
    pub largest_trade_eur: f64,
    pub strategies_count: usize,
    /// Ten largest underlyings by notional.
    pub top_underlyings: Vec<UnderlyingVolume>,
    /// Ascending by hour.
    pub trades_per_hour: Vec<HourlyCount>,
    /// Descending by count, then type name.
    pub strategy_distribution: Vec<StrategyTypeCount>,
}

pub fn summary_metrics(trades: &[Trade], strategies: &[Strategy]) -> SummaryMetrics {
    let mut total = 0.0;
    let mut largest = 0.0f64;
    let mut underlyings: HashMap<&str, f64> = HashMap::new();
    let mut hours: BTreeMap<String, usize> = BTreeMap::new();

    for trade in trades {
        let notional = trade.notional_eur_or_zero();
        total += notional;
        largest = largest.max(notional);
        if let Some(name) = trade.underlying() {
            *underlyings.entry(name).or_default() += notional;
        }
        let hour = trade.execution_timestamp.format("%Y-%m-%dT%H:00").to_string();
        *hours.entry(hour).or_default() += 1;
    }

    let mut top_underlyings: Vec<UnderlyingVolume> = underlyings
        .into_iter()
        .map(|(name, notional)| UnderlyingVolume {
            name: name.to_string(),
            notional: safe(notional),
        })
        .collect();
    top_underlyings.sort_by(|a, b| {
        b.notional
            .total_cmp(&a.notional)
            .then_with(|| a.name.cmp(&b.name))
    });
    top_underlyings.truncate(TOP_UNDERLYINGS);

    let mut by_type: HashMap<&str, usize> = HashMap::new();
    for strategy in strategies {
        *by_type.entry(strategy.strategy_type.as_str()).or_default() += 1;
    }
    let mut strategy_distribution: Vec<StrategyTypeCount> = by_type
        .into_iter()
        .map(|(t, count)| StrategyTypeCount {
            strategy_type: t.to_string(),
            count,
        })
        .collect();
    strategy_distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.strategy_type.cmp(&b.strategy_type))
    });

    SummaryMetrics {
        total_trades: trades.len(),
        total_notional_eur: safe(total),
        avg_size_eur: ratio(total, trades.len() as f64),
        largest_trade_eur: safe(largest),
        strategies_count: strategies.len(),
        top_underlyings,
        trades_per_hour: hours
            .into_iter()
            .map(|(hour, count)| HourlyCount { hour, count })
            .collect(),
        strategy_distribution,
    }
}
