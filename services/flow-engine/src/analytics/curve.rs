//! Curve metrics: notional and average rate per instrument

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use swap_types::tenor;
use swap_types::trade::Trade;

use super::safe;

/// Curve spreads reported when both legs have an average rate.
const CURVE_SPREADS: &[(&str, &str, &str)] = &[("10Y-2Y", "10Y", "2Y"), ("30Y-10Y", "30Y", "10Y")];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentRow {
    #[serde(alias = "tenor")]
    pub instrument: String,
    pub notional: f64,
    pub count: usize,
    /// Mean reported fixed rate, absent when no trade carried one.
    pub avg_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveMetrics {
    /// Rows in canonical tenor order.
    pub instrument_distribution: Vec<InstrumentRow>,
    pub average_rate_by_instrument: BTreeMap<String, f64>,
    /// `"10Y-2Y"`, `"30Y-10Y"` in reported rate units.
    pub instrument_spread: BTreeMap<String, f64>,
}

#[derive(Default)]
struct Acc {
    notional: f64,
    count: usize,
    rate_sum: f64,
    rate_count: usize,
}

pub fn curve_metrics(trades: &[Trade]) -> CurveMetrics {
    let mut groups: HashMap<&str, Acc> = HashMap::new();
    for trade in trades {
        let Some(instrument) = trade.instrument() else {
            continue;
        };
        let acc = groups.entry(instrument).or_default();
        acc.notional += trade.notional_eur_or_zero();
        acc.count += 1;
        if let Some(rate) = trade.fixed_rate() {
            acc.rate_sum += rate;
            acc.rate_count += 1;
        }
    }

    let mut rows: Vec<InstrumentRow> = groups
        .into_iter()
        .map(|(instrument, acc)| InstrumentRow {
            instrument: instrument.to_string(),
            notional: safe(acc.notional),
            count: acc.count,
            avg_rate: (acc.rate_count > 0).then(|| safe(acc.rate_sum / acc.rate_count as f64)),
        })
        .collect();
    rows.sort_by(|a, b| tenor::compare(&a.instrument, &b.instrument));

    let average_rate_by_instrument: BTreeMap<String, f64> = rows
        .iter()
        .filter_map(|r| r.avg_rate.map(|rate| (r.instrument.clone(), rate)))
        .collect();

    let instrument_spread = CURVE_SPREADS
        .iter()
        .filter_map(|(name, long, short)| {
            let l = average_rate_by_instrument.get(*long)?;
            let s = average_rate_by_instrument.get(*short)?;
            Some((name.to_string(), safe(l - s)))
        })
        .collect();

    CurveMetrics {
        instrument_distribution: rows,
        average_rate_by_instrument,
        instrument_spread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use swap_types::ids::TradeId;
    use swap_types::trade::ActionType;

    fn trade(id: &str, instrument: &str, notional: f64, rate: Option<f64>) -> Trade {
        let mut t = Trade::new(
            TradeId::new(id),
            ActionType::New,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        )
        .with_instrument(instrument)
        .with_notional_eur(notional);
        t.fixed_rate_leg1 = rate;
        t
    }

    #[test]
    fn test_rows_follow_tenor_order() {
        let trades = vec![
            trade("A", "30Y", 1.0, None),
            trade("B", "CUSTOM", 1.0, None),
            trade("C", "2Y", 1.0, None),
            trade("D", "10Y", 1.0, None),
        ];
        let m = curve_metrics(&trades);
        let order: Vec<_> = m
            .instrument_distribution
            .iter()
            .map(|r| r.instrument.as_str())
            .collect();
        assert_eq!(order, vec!["2Y", "10Y", "30Y", "CUSTOM"]);
    }

    #[test]
    fn test_average_rate_ignores_missing() {
        let trades = vec![
            trade("A", "10Y", 100.0, Some(0.03)),
            trade("B", "10Y", 50.0, None),
            trade("C", "10Y", 50.0, Some(0.02)),
        ];
        let m = curve_metrics(&trades);
        let row = &m.instrument_distribution[0];
        assert_eq!(row.count, 3);
        assert_eq!(row.notional, 200.0);
        assert!((row.avg_rate.unwrap() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_spreads_need_both_ends() {
        let trades = vec![
            trade("A", "2Y", 1.0, Some(0.02)),
            trade("B", "10Y", 1.0, Some(0.03)),
            trade("C", "30Y", 1.0, None),
        ];
        let m = curve_metrics(&trades);
        assert!((m.instrument_spread["10Y-2Y"] - 0.01).abs() < 1e-12);
        assert!(!m.instrument_spread.contains_key("30Y-10Y"));
    }

    #[test]
    fn test_trades_without_instrument_skipped() {
        let mut t = trade("A", "10Y", 1.0, None);
        t.instrument = None;
        let m = curve_metrics(&[t]);
        assert!(m.instrument_distribution.is_empty());
        assert!(m.instrument_spread.is_empty());
    }
}
