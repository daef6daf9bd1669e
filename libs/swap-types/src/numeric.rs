//! Numeric helpers shared by every aggregation
//!
//! Reported swap data is noisy: notionals arrive as numbers or as
//! abbreviated strings ("20M", "1.5B+"), rates arrive either as decimals
//! (0.0275) or as percentages (2.75), and upstream serializers sometimes
//! leak NaN/Infinity. Everything downstream relies on the guarantee that a
//! stored `f64` is finite.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::errors::TypeError;

/// One basis point expressed in percent.
pub const BP_IN_PERCENT: f64 = 0.01;

/// Return the value only if it is finite.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Drop a non-finite optional value.
#[inline]
pub fn sanitize(value: Option<f64>) -> Option<f64> {
    value.and_then(finite)
}

/// Accumulator view of an optional value: absent or non-finite counts as 0.
#[inline]
pub fn or_zero(value: Option<f64>) -> f64 {
    sanitize(value).unwrap_or(0.0)
}

/// Clamp a derived metric into `[0, 100]`, mapping non-finite to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Normalize a reported fixed rate to percent.
///
/// Values with magnitude above 1 are assumed to already be percentages,
/// everything else is a decimal fraction.
pub fn rate_to_percent(raw: f64) -> f64 {
    if raw.abs() > 1.0 {
        raw
    } else {
        raw * 100.0
    }
}

/// Parse an abbreviated notional string such as `"20M"`, `"2B"`,
/// `"150K"`, `"1,500,000"` or `"5B+"`.
pub fn parse_notional(text: &str) -> Result<f64, TypeError> {
    let upper = text.trim().to_ascii_uppercase();
    let cleaned: String = upper
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.trim_end_matches('+');

    if cleaned.is_empty() || matches!(cleaned, "NAN" | "NONE" | "NULL") {
        return Err(TypeError::InvalidNotional(text.to_string()));
    }

    let (digits, multiplier) = match cleaned.chars().last() {
        Some('B') => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000_000_000u64)),
        Some('M') => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000_000u64)),
        Some('K') => (&cleaned[..cleaned.len() - 1], Decimal::from(1_000u64)),
        _ => (cleaned, Decimal::ONE),
    };

    let value = match Decimal::from_str(digits) {
        Ok(d) => d
            .checked_mul(multiplier)
            .and_then(|v| v.to_f64())
            .ok_or_else(|| TypeError::InvalidNotional(text.to_string()))?,
        // Scientific notation is outside Decimal's grammar
        Err(_) => {
            let base: f64 = digits
                .parse()
                .map_err(|_| TypeError::InvalidNotional(text.to_string()))?;
            base * multiplier.to_f64().unwrap_or(1.0)
        }
    };

    finite(value).ok_or_else(|| TypeError::InvalidNotional(text.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Num(f64),
    Text(String),
}

/// Deserialize an optional notional from a number, an abbreviated string,
/// or null. Unparsable or non-finite input decodes as `None`.
pub fn deserialize_notional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<NumberRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(NumberRepr::Num(v)) => finite(v),
        Some(NumberRepr::Text(s)) => parse_notional(&s).ok(),
        None => None,
    })
}

/// Deserialize an optional plain number that may also be quoted.
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<NumberRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(NumberRepr::Num(v)) => finite(v),
        Some(NumberRepr::Text(s)) => s.trim().parse::<f64>().ok().and_then(finite),
        None => None,
    })
}

/// Deserialize an optional string that upstream may encode as a number
/// (package transaction prices arrive both ways).
pub fn deserialize_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<NumberRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(NumberRepr::Num(v)) => finite(v).map(|v| v.to_string()),
        Some(NumberRepr::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty()
                || matches!(trimmed.to_ascii_lowercase().as_str(), "nan" | "none" | "null")
            {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    })
}
