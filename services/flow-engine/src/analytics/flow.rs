//! Flow metrics: action tallies and platform market share

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use swap_types::trade::{ActionType, Trade};

use super::{ratio, safe};

const UNKNOWN_PLATFORM: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformShare {
    pub platform: String,
    pub notional: f64,
    pub count: usize,
    /// Share of total notional, in percent.
    pub percentage: f64,
    pub avg_size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowDirection {
    pub new: usize,
    pub modified: usize,
    pub terminated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowMetrics {
    /// Count per action code (`NEWT`, `MODI`, `TERM`, ...).
    pub action_breakdown: BTreeMap<String, usize>,
    /// Descending by notional.
    pub platform_market_share: Vec<PlatformShare>,
    pub flow_direction: FlowDirection,
}

pub fn flow_metrics(trades: &[Trade]) -> FlowMetrics {
    let mut action_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    let mut direction = FlowDirection::default();
    let mut platforms: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut total = 0.0;

    for trade in trades {
        *action_breakdown
            .entry(trade.action_type.as_str().to_string())
            .or_default() += 1;
        match trade.action_type {
            ActionType::New => direction.new += 1,
            ActionType::Modify => direction.modified += 1,
            ActionType::Terminate => direction.terminated += 1,
            ActionType::Other(_) => {}
        }

        let notional = trade.notional_eur_or_zero();
        total += notional;
        let entry = platforms
            .entry(trade.platform().unwrap_or(UNKNOWN_PLATFORM))
            .or_default();
        entry.0 += notional;
        entry.1 += 1;
    }

    let mut platform_market_share: Vec<PlatformShare> = platforms
        .into_iter()
        .map(|(platform, (notional, count))| PlatformShare {
            platform: platform.to_string(),
            notional: safe(notional),
            count,
            percentage: ratio(notional, total) * 100.0,
            avg_size: ratio(notional, count as f64),
        })
        .collect();
    platform_market_share.sort_by(|a, b| {
        b.notional
            .total_cmp(&a.notional)
            .then_with(|| a.platform.cmp(&b.platform))
    });

    FlowMetrics {
        action_breakdown,
        platform_market_share,
        flow_direction: direction,
    }
}
