//! Currency exposure and the instrument × currency heatmap

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use swap_types::tenor;
use swap_types::trade::Trade;

use super::safe;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyExposure {
    pub currency: String,
    pub notional: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapCell {
    #[serde(alias = "tenor")]
    pub instrument: String,
    pub currency: String,
    pub notional: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyMetrics {
    /// Descending by notional.
    pub currency_breakdown: Vec<CurrencyExposure>,
    /// Largest cells first, capped.
    pub currency_heatmap: Vec<HeatmapCell>,
}

/// Exposure counts each distinct leg currency once per trade.
pub fn currency_metrics(trades: &[Trade], heatmap_cap: usize) -> CurrencyMetrics {
    let mut exposure: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut cells: HashMap<(&str, &str), f64> = HashMap::new();

    for trade in trades {
        let notional = trade.notional_eur_or_zero();
        let instrument = trade.instrument();
        for ccy in trade.currencies() {
            let entry = exposure.entry(ccy).or_default();
            entry.0 += notional;
            entry.1 += 1;
            if let Some(instrument) = instrument {
                *cells.entry((instrument, ccy)).or_default() += notional;
            }
        }
    }

    let mut currency_breakdown: Vec<CurrencyExposure> = exposure
        .into_iter()
        .map(|(currency, (notional, count))| CurrencyExposure {
            currency: currency.to_string(),
            notional: safe(notional),
            count,
        })
        .collect();
    currency_breakdown.sort_by(|a, b| {
        b.notional
            .total_cmp(&a.notional)
            .then_with(|| a.currency.cmp(&b.currency))
    });

    let mut currency_heatmap: Vec<HeatmapCell> = cells
        .into_iter()
        .map(|((instrument, currency), notional)| HeatmapCell {
            instrument: instrument.to_string(),
            currency: currency.to_string(),
            notional: safe(notional),
        })
        .collect();
    currency_heatmap.sort_by(|a, b| {
        b.notional
            .total_cmp(&a.notional)
            .then_with(|| tenor::compare(&a.instrument, &b.instrument))
            .then_with(|| a.currency.cmp(&b.currency))
    });
    currency_heatmap.truncate(heatmap_cap);

    CurrencyMetrics {
        currency_breakdown,
        currency_heatmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use swap_types::ids::TradeId;
    use swap_types::trade::ActionType;

    fn trade(id: &str, instrument: &str, leg1: &str, leg2: &str, notional: f64) -> Trade {
        Trade::new(
            TradeId::new(id),
            ActionType::New,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        )
        .with_instrument(instrument)
        .with_currencies(leg1, leg2)
        .with_notional_eur(notional)
    }

    #[test]
    fn test_same_currency_legs_counted_once() {
        let m = currency_metrics(&[trade("A", "10Y", "EUR", "EUR", 100.0)], 100);
        assert_eq!(m.currency_breakdown.len(), 1);
        assert_eq!(m.currency_breakdown[0].notional, 100.0);
        assert_eq!(m.currency_breakdown[0].count, 1);
    }

    #[test]
    fn test_cross_currency_counts_both() {
        let m = currency_metrics(&[trade("A", "5Y", "USD", "EUR", 100.0)], 100);
        assert_eq!(m.currency_breakdown.len(), 2);
        assert_eq!(m.currency_heatmap.len(), 2);
    }

    #[test]
    fn test_heatmap_capped_to_largest() {
        let trades = vec![
            trade("A", "2Y", "EUR", "EUR", 10.0),
            trade("B", "5Y", "EUR", "EUR", 30.0),
            trade("C", "10Y", "EUR", "EUR", 20.0),
        ];
        let m = currency_metrics(&trades, 2);
        let kept: Vec<_> = m
            .currency_heatmap
            .iter()
            .map(|c| c.instrument.as_str())
            .collect();
        assert_eq!(kept, vec!["5Y", "10Y"]);
    }
}
