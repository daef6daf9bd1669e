//! Strategy metrics, resolved against the trade list through leg ids

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use swap_types::ids::TradeId;
use swap_types::strategy::Strategy;
use swap_types::tenor;
use swap_types::trade::Trade;

use super::{ratio, safe};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTypeNotional {
    #[serde(rename = "type")]
    pub strategy_type: String,
    pub count: usize,
    pub avg_notional: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentPreference {
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Canonical tenor order.
    pub instruments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentUsage {
    pub instrument: String,
    /// Notional of the leg trades on this instrument.
    pub notional: f64,
    /// Number of strategy types trading it.
    pub strategy_types: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageVsCustom {
    pub package: usize,
    pub custom: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyMetrics {
    /// Descending by average notional.
    pub strategy_avg_notional: Vec<StrategyTypeNotional>,
    /// Ordered by type name.
    pub strategy_instrument_preference: Vec<InstrumentPreference>,
    pub package_vs_custom: PackageVsCustom,
    /// Descending by notional.
    pub instrument_ranking: Vec<InstrumentUsage>,
}

pub fn strategy_metrics(strategies: &[Strategy], trades: &[Trade]) -> StrategyMetrics {
    let by_id: HashMap<&TradeId, &Trade> = trades.iter().map(|t| (t.id(), t)).collect();

    let mut notionals: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut instruments_by_type: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut legs_by_instrument: HashMap<&str, HashSet<&TradeId>> = HashMap::new();
    let mut package = 0usize;

    for strategy in strategies {
        let stype = strategy.strategy_type.as_str();
        let entry = notionals.entry(stype).or_default();
        entry.0 += strategy.total_notional_or_zero();
        entry.1 += 1;
        if strategy.is_package() {
            package += 1;
        }

        for leg in &strategy.legs {
            let Some(trade) = by_id.get(leg) else {
                continue;
            };
            let Some(instrument) = trade.instrument() else {
                continue;
            };
            instruments_by_type.entry(stype).or_default().insert(instrument);
            legs_by_instrument.entry(instrument).or_default().insert(trade.id());
        }
    }

    let mut strategy_avg_notional: Vec<StrategyTypeNotional> = notionals
        .into_iter()
        .map(|(stype, (total, count))| StrategyTypeNotional {
            strategy_type: stype.to_string(),
            count,
            avg_notional: ratio(total, count as f64),
        })
        .collect();
    strategy_avg_notional.sort_by(|a, b| {
        b.avg_notional
            .total_cmp(&a.avg_notional)
            .then_with(|| a.strategy_type.cmp(&b.strategy_type))
    });

    let mut types_per_instrument: HashMap<&str, usize> = HashMap::new();
    let strategy_instrument_preference = instruments_by_type
        .iter()
        .map(|(stype, set)| {
            let mut instruments: Vec<&str> = set.iter().copied().collect();
            instruments.sort_by(|a, b| tenor::compare(a, b));
            for i in &instruments {
                *types_per_instrument.entry(*i).or_default() += 1;
            }
            InstrumentPreference {
                strategy_type: stype.to_string(),
                instruments: instruments.into_iter().map(str::to_string).collect(),
            }
        })
        .collect();

    let mut instrument_ranking: Vec<InstrumentUsage> = legs_by_instrument
        .into_iter()
        .map(|(instrument, legs)| {
            let notional: f64 = legs
                .iter()
                .filter_map(|id| by_id.get(*id))
                .map(|t| t.notional_eur_or_zero())
                .sum();
            InstrumentUsage {
                instrument: instrument.to_string(),
                notional: safe(notional),
                strategy_types: types_per_instrument.get(instrument).copied().unwrap_or(0),
            }
        })
        .collect();
    instrument_ranking.sort_by(|a, b| {
        b.notional
            .total_cmp(&a.notional)
            .then_with(|| tenor::compare(&a.instrument, &b.instrument))
    });

    StrategyMetrics {
        strategy_avg_notional,
        strategy_instrument_preference,
        package_vs_custom: PackageVsCustom {
            package,
            custom: strategies.len() - package,
        },
        instrument_ranking,
    }
}
