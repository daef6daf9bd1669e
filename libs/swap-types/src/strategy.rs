//! Multi-leg strategy records (spreads, butterflies, curve packages)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{StrategyId, TradeId};
use crate::numeric::{deserialize_lenient_f64, deserialize_stringish, or_zero, sanitize};
use crate::time::deserialize_timestamp;

/// A strategy detected upstream from a set of trade legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub strategy_id: StrategyId,
    /// Spread, Butterfly, Curve, ...
    pub strategy_type: String,
    #[serde(default)]
    pub underlying_name: String,
    /// Leg trade ids in leg order.
    #[serde(default)]
    pub legs: Vec<TradeId>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub total_notional_eur: Option<f64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub execution_start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub execution_end: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub package_transaction_price: Option<String>,
}

impl Strategy {
    pub fn new(
        strategy_id: StrategyId,
        strategy_type: impl Into<String>,
        legs: Vec<TradeId>,
        execution_start: DateTime<Utc>,
        execution_end: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_id,
            strategy_type: strategy_type.into(),
            underlying_name: String::new(),
            legs,
            total_notional_eur: None,
            execution_start,
            execution_end,
            package_transaction_price: None,
        }
    }

    pub fn with_total_notional(mut self, notional: f64) -> Self {
        self.total_notional_eur = Some(notional);
        self
    }

    pub fn with_package_price(mut self, price: impl Into<String>) -> Self {
        self.package_transaction_price = Some(price.into());
        self
    }

    pub fn id(&self) -> &StrategyId {
        &self.strategy_id
    }

    pub fn total_notional_or_zero(&self) -> f64 {
        or_zero(self.total_notional_eur)
    }

    /// Package strategies carry a package transaction price; the rest were
    /// assembled from individually reported legs.
    pub fn is_package(&self) -> bool {
        self.package_transaction_price.is_some()
    }

    pub fn sanitize(&mut self) {
        self.total_notional_eur = sanitize(self.total_notional_eur);
    }
}
