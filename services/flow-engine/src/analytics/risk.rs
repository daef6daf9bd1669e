//! Risk metrics: DV01, concentration, notional distribution

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use swap_types::tenor;
use swap_types::trade::Trade;

use super::{ratio, safe};

/// One basis point as a fraction.
const BASIS_POINT: f64 = 0.0001;

/// Upper bounds (exclusive) of the notional buckets; the last is open.
const BUCKETS: &[(&str, f64)] = &[
    ("<100M", 100_000_000.0),
    ("100M-500M", 500_000_000.0),
    ("500M-1B", 1_000_000_000.0),
    ("1B-5B", 5_000_000_000.0),
    (">5B", f64::INFINITY),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionalBucket {
    pub bucket: String,
    pub count: usize,
}

/// Nearest-rank percentiles of trade notionals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Percentiles {
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMetrics {
    pub total_dv01: f64,
    pub dv01_by_instrument: BTreeMap<String, f64>,
    pub notional_distribution: Vec<NotionalBucket>,
    /// Herfindahl–Hirschman index over underlyings, 0..=10000.
    pub concentration_hhi: f64,
    /// Percent of notional held by the five largest underlyings.
    pub top5_concentration: f64,
    pub percentiles: Percentiles,
}

/// DV01 approximation for one position.
pub fn dv01(notional_eur: f64, instrument: &str) -> f64 {
    safe(notional_eur * tenor::duration(instrument) * BASIS_POINT)
}

/// HHI = Σ share² × 10000 over positive volumes.
pub fn hhi<'a>(volumes: impl IntoIterator<Item = &'a f64>) -> f64 {
    let volumes: Vec<f64> = volumes.into_iter().copied().filter(|v| *v > 0.0).collect();
    let total: f64 = volumes.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    safe(volumes.iter().map(|v| (v / total).powi(2)).sum::<f64>() * 10_000.0)
}

/// Nearest-rank percentile at index `floor(n × p)`, clamped to the last
/// element. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn risk_metrics(trades: &[Trade]) -> RiskMetrics {
    let mut total_dv01 = 0.0;
    let mut dv01_by_instrument: BTreeMap<String, f64> = BTreeMap::new();
    let mut notionals: Vec<f64> = Vec::new();
    let mut underlyings: HashMap<&str, f64> = HashMap::new();

    for trade in trades {
        let Some(notional) = trade.notional_eur.filter(|v| v.is_finite()) else {
            continue;
        };
        notionals.push(notional);
        if let Some(instrument) = trade.instrument() {
            let contribution = dv01(notional, instrument);
            total_dv01 += contribution;
            *dv01_by_instrument.entry(instrument.to_string()).or_default() += contribution;
        }
        if let Some(name) = trade.underlying() {
            *underlyings.entry(name).or_default() += notional;
        }
    }

    let mut counts = vec![0usize; BUCKETS.len()];
    for n in &notionals {
        let slot = BUCKETS
            .iter()
            .position(|(_, upper)| *n < *upper)
            .unwrap_or(BUCKETS.len() - 1);
        counts[slot] += 1;
    }
    let notional_distribution = BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| NotionalBucket {
            bucket: label.to_string(),
            count,
        })
        .collect();

    notionals.sort_by(f64::total_cmp);
    let percentiles = Percentiles {
        p50: percentile(&notionals, 0.50),
        p75: percentile(&notionals, 0.75),
        p90: percentile(&notionals, 0.90),
        p95: percentile(&notionals, 0.95),
        p99: percentile(&notionals, 0.99),
    };

    let mut volumes: Vec<f64> = underlyings.values().copied().filter(|v| *v > 0.0).collect();
    let underlying_total: f64 = volumes.iter().sum();
    volumes.sort_by(|a, b| b.total_cmp(a));
    let top5: f64 = volumes.iter().take(5).sum();

    RiskMetrics {
        total_dv01: safe(total_dv01),
        dv01_by_instrument: dv01_by_instrument
            .into_iter()
            .map(|(k, v)| (k, safe(v)))
            .collect(),
        notional_distribution,
        concentration_hhi: hhi(volumes.iter()),
        top5_concentration: ratio(top5, underlying_total) * 100.0,
        percentiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use swap_types::ids::TradeId;
    use swap_types::trade::ActionType;

    fn trade(id: &str, notional: f64) -> Trade {
        Trade::new(
            TradeId::new(id),
            ActionType::New,
            Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        )
        .with_notional_eur(notional)
    }

    #[test]
    fn test_hhi_two_underlyings() {
        let trades = vec![
            trade("1", 60.0).with_underlier("A"),
            trade("2", 40.0).with_underlier("B"),
        ];
        let m = risk_metrics(&trades);
        assert!((m.concentration_hhi - 5200.0).abs() < 1e-9);
        assert_eq!(m.top5_concentration, 100.0);
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let trades: Vec<Trade> = [40.0, 10.0, 100.0, 30.0, 20.0]
            .iter()
            .enumerate()
            .map(|(i, n)| trade(&i.to_string(), *n))
            .collect();
        let m = risk_metrics(&trades);
        assert_eq!(m.percentiles.p50, 30.0);
        assert_eq!(m.percentiles.p75, 40.0);
        assert_eq!(m.percentiles.p99, 100.0);
    }

    #[test]
    fn test_single_value_percentiles() {
        assert_eq!(percentile(&[7.0], 0.99), 7.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_dv01_uses_duration_table() {
        let trades = vec![
            trade("1", 100_000_000.0).with_instrument("10Y"),
            trade("2", 100_000_000.0).with_instrument("5Y10Y"),
            trade("3", 100_000_000.0).with_instrument("ODD"),
        ];
        let m = risk_metrics(&trades);
        // 10Y: 8.0, forward pair keyed by its swap tenor, unknown: 5.0
        assert!((m.dv01_by_instrument["10Y"] - 80_000.0).abs() < 1e-6);
        assert!((m.dv01_by_instrument["5Y10Y"] - 80_000.0).abs() < 1e-6);
        assert!((m.dv01_by_instrument["ODD"] - 50_000.0).abs() < 1e-6);
        assert!((m.total_dv01 - 210_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_buckets() {
        let trades = vec![
            trade("1", 50_000_000.0),
            trade("2", 100_000_000.0),
            trade("3", 750_000_000.0),
            trade("4", 5_000_000_000.0),
        ];
        let m = risk_metrics(&trades);
        let counts: Vec<usize> = m.notional_distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_missing_notional_excluded() {
        let mut t = trade("1", 0.0);
        t.notional_eur = None;
        let m = risk_metrics(&[t]);
        assert_eq!(m.percentiles, Percentiles::default());
        assert_eq!(m.concentration_hhi, 0.0);
        assert_eq!(m.notional_distribution.len(), 5);
    }
}
