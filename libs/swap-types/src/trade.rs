//! Reported interest-rate-swap trades
//!
//! Field names follow the public swap-data-repository dissemination
//! format so that upstream payloads decode without a mapping layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{StrategyId, TradeId};
use crate::numeric::{
    deserialize_lenient_f64, deserialize_notional, deserialize_stringish, or_zero, sanitize,
};
use crate::time::{deserialize_opt_timestamp, deserialize_timestamp};

/// Dissemination action of a trade report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    /// NEWT: a new trade
    New,
    /// MODI: a modification of a previously reported trade
    Modify,
    /// TERM: an early termination
    Terminate,
    /// Any other action code (CORR, EROR, ...), kept verbatim
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::New => "NEWT",
            ActionType::Modify => "MODI",
            ActionType::Terminate => "TERM",
            ActionType::Other(code) => code,
        }
    }
}

impl From<String> for ActionType {
    fn from(code: String) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "NEWT" => ActionType::New,
            "MODI" => ActionType::Modify,
            "TERM" => ActionType::Terminate,
            _ => ActionType::Other(code),
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two swap legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSide {
    Leg1,
    Leg2,
}

/// Borrowed view of one swap leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapLeg<'a> {
    pub notional: Option<f64>,
    pub currency: Option<&'a str>,
    pub fixed_rate: Option<f64>,
    pub spread: Option<f64>,
}

/// A leg embedded in a package trade report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageLeg {
    #[serde(default)]
    pub dissemination_identifier: Option<String>,
    #[serde(default, deserialize_with = "deserialize_notional")]
    pub notional_amount: Option<f64>,
    #[serde(default)]
    pub notional_currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fixed_rate: Option<f64>,
    #[serde(default, alias = "tenor")]
    pub instrument: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub execution_timestamp: Option<DateTime<Utc>>,
}

/// A reported IRS trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub dissemination_identifier: TradeId,
    #[serde(default)]
    pub original_dissemination_identifier: Option<String>,
    pub action_type: ActionType,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub event_timestamp: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub execution_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub is_forward: bool,

    // Legs
    #[serde(default, deserialize_with = "deserialize_notional")]
    pub notional_amount_leg1: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_notional")]
    pub notional_amount_leg2: Option<f64>,
    #[serde(default)]
    pub notional_currency_leg1: Option<String>,
    #[serde(default)]
    pub notional_currency_leg2: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fixed_rate_leg1: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub fixed_rate_leg2: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub spread_leg1: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub spread_leg2: Option<f64>,

    // Product
    #[serde(default)]
    pub unique_product_identifier: Option<String>,
    #[serde(default)]
    pub unique_product_identifier_short_name: Option<String>,
    #[serde(default)]
    pub unique_product_identifier_underlier_name: Option<String>,
    #[serde(default, alias = "tenor")]
    pub instrument: Option<String>,

    #[serde(default)]
    pub platform_identifier: Option<String>,

    // Packages and strategies
    #[serde(default)]
    pub package_indicator: bool,
    #[serde(default, deserialize_with = "deserialize_stringish")]
    pub package_transaction_price: Option<String>,
    #[serde(default)]
    pub package_legs: Vec<PackageLeg>,
    #[serde(default)]
    pub package_legs_count: Option<u32>,
    #[serde(default)]
    pub strategy_id: Option<StrategyId>,

    /// Notional converted to EUR by the upstream normalizer.
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub notional_eur: Option<f64>,
}

impl Trade {
    /// Create a bare trade; every optional attribute starts absent.
    pub fn new(
        dissemination_identifier: TradeId,
        action_type: ActionType,
        execution_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            dissemination_identifier,
            original_dissemination_identifier: None,
            action_type,
            event_type: None,
            event_timestamp: None,
            execution_timestamp,
            effective_date: None,
            expiration_date: None,
            is_forward: false,
            notional_amount_leg1: None,
            notional_amount_leg2: None,
            notional_currency_leg1: None,
            notional_currency_leg2: None,
            fixed_rate_leg1: None,
            fixed_rate_leg2: None,
            spread_leg1: None,
            spread_leg2: None,
            unique_product_identifier: None,
            unique_product_identifier_short_name: None,
            unique_product_identifier_underlier_name: None,
            instrument: None,
            platform_identifier: None,
            package_indicator: false,
            package_transaction_price: None,
            package_legs: Vec::new(),
            package_legs_count: None,
            strategy_id: None,
            notional_eur: None,
        }
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn with_notional_eur(mut self, notional: f64) -> Self {
        self.notional_eur = Some(notional);
        self
    }

    pub fn with_fixed_rate(mut self, rate: f64) -> Self {
        self.fixed_rate_leg1 = Some(rate);
        self
    }

    pub fn with_currencies(mut self, leg1: &str, leg2: &str) -> Self {
        self.notional_currency_leg1 = Some(leg1.to_string());
        self.notional_currency_leg2 = Some(leg2.to_string());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_identifier = Some(platform.into());
        self
    }

    pub fn with_underlier(mut self, underlier: impl Into<String>) -> Self {
        self.unique_product_identifier_underlier_name = Some(underlier.into());
        self
    }

    pub fn id(&self) -> &TradeId {
        &self.dissemination_identifier
    }

    /// View one leg of the swap.
    pub fn leg(&self, side: LegSide) -> SwapLeg<'_> {
        match side {
            LegSide::Leg1 => SwapLeg {
                notional: self.notional_amount_leg1,
                currency: non_blank(&self.notional_currency_leg1),
                fixed_rate: self.fixed_rate_leg1,
                spread: self.spread_leg1,
            },
            LegSide::Leg2 => SwapLeg {
                notional: self.notional_amount_leg2,
                currency: non_blank(&self.notional_currency_leg2),
                fixed_rate: self.fixed_rate_leg2,
                spread: self.spread_leg2,
            },
        }
    }

    /// Rate used for curve aggregation: leg-1 fixed rate, else leg-2.
    pub fn fixed_rate(&self) -> Option<f64> {
        sanitize(self.fixed_rate_leg1).or(sanitize(self.fixed_rate_leg2))
    }

    /// Instrument label, if present and non-blank.
    pub fn instrument(&self) -> Option<&str> {
        non_blank(&self.instrument)
    }

    /// Underlying index name used for concentration measures.
    pub fn underlying(&self) -> Option<&str> {
        non_blank(&self.unique_product_identifier_underlier_name)
    }

    pub fn platform(&self) -> Option<&str> {
        non_blank(&self.platform_identifier)
    }

    /// EUR notional for accumulators (absent counts as zero).
    pub fn notional_eur_or_zero(&self) -> f64 {
        or_zero(self.notional_eur)
    }

    /// Distinct leg currencies, leg-1 first.
    pub fn currencies(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(2);
        for side in [LegSide::Leg1, LegSide::Leg2] {
            if let Some(ccy) = self.leg(side).currency {
                if !out.contains(&ccy) {
                    out.push(ccy);
                }
            }
        }
        out
    }

    /// Replace every non-finite numeric field with `None`.
    pub fn sanitize(&mut self) {
        for field in [
            &mut self.notional_amount_leg1,
            &mut self.notional_amount_leg2,
            &mut self.fixed_rate_leg1,
            &mut self.fixed_rate_leg2,
            &mut self.spread_leg1,
            &mut self.spread_leg2,
            &mut self.notional_eur,
        ] {
            *field = sanitize(*field);
        }
        for leg in &mut self.package_legs {
            leg.notional_amount = sanitize(leg.notional_amount);
            leg.fixed_rate = sanitize(leg.fixed_rate);
        }
    }

    /// Whether every numeric field is finite or absent.
    pub fn is_sanitized(&self) -> bool {
        let fields = [
            self.notional_amount_leg1,
            self.notional_amount_leg2,
            self.fixed_rate_leg1,
            self.fixed_rate_leg2,
            self.spread_leg1,
            self.spread_leg2,
            self.notional_eur,
        ];
        fields.iter().flatten().all(|v| v.is_finite())
            && self.package_legs.iter().all(|leg| {
                [leg.notional_amount, leg.fixed_rate]
                    .iter()
                    .flatten()
                    .all(|v| v.is_finite())
            })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
