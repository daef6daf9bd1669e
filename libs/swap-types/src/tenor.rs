//! Tenor tables for swap instruments
//!
//! An instrument label is either a single tenor ("10Y") or a forward
//! tenor pair ("5Y10Y" = 10Y swap starting in 5Y).

use std::cmp::Ordering;

/// Canonical curve order used for every per-instrument listing.
pub const TENOR_ORDER: &[&str] = &[
    "1W", "1M", "2M", "3M", "6M", "9M", "1Y", "18M", "2Y", "3Y", "4Y", "5Y", "6Y", "7Y", "8Y",
    "9Y", "10Y", "12Y", "15Y", "20Y", "25Y", "30Y", "40Y", "50Y",
];

/// Modified-duration estimates used by the DV01 approximation.
const DURATIONS: &[(&str, f64)] = &[
    ("3M", 0.25),
    ("6M", 0.5),
    ("1Y", 0.95),
    ("2Y", 1.9),
    ("3Y", 2.85),
    ("5Y", 4.5),
    ("7Y", 6.2),
    ("10Y", 8.0),
    ("15Y", 11.5),
    ("20Y", 14.5),
    ("30Y", 18.0),
];

/// Duration used when the tenor is not in the table.
pub const DEFAULT_DURATION: f64 = 5.0;

/// Position of an instrument in the canonical order, `None` when unknown.
pub fn rank(instrument: &str) -> Option<usize> {
    TENOR_ORDER.iter().position(|t| *t == instrument)
}

/// Canonical ordering: known tenors by curve position, unknown ones last
/// and alphabetically among themselves.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Split an instrument label into its tenor components.
///
/// `"5Y10Y"` → `["5Y", "10Y"]`, `"10Y"` → `["10Y"]`. Labels that do not
/// follow the digits-then-unit grammar yield an empty list.
pub fn components(instrument: &str) -> Vec<&str> {
    let bytes = instrument.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start || i >= bytes.len() {
            return Vec::new();
        }
        if !matches!(bytes[i], b'D' | b'W' | b'M' | b'Y') {
            return Vec::new();
        }
        i += 1;
        parts.push(&instrument[start..i]);
        start = i;
    }
    parts
}

/// The swap (trailing) tenor of an instrument, used for duration lookup.
pub fn base_tenor(instrument: &str) -> &str {
    components(instrument)
        .last()
        .copied()
        .unwrap_or(instrument)
}

/// Estimated duration for an instrument, keyed by its base tenor.
pub fn duration(instrument: &str) -> f64 {
    let base = base_tenor(instrument);
    DURATIONS
        .iter()
        .find(|(t, _)| *t == base)
        .map(|(_, d)| *d)
        .unwrap_or(DEFAULT_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        assert_eq!(components("10Y"), vec!["10Y"]);
        assert_eq!(components("5Y10Y"), vec!["5Y", "10Y"]);
        assert_eq!(components("3M"), vec!["3M"]);
        assert!(components("BOGUS").is_empty());
        assert!(components("10").is_empty());
    }

    #[test]
    fn test_duration_lookup() {
        assert_eq!(duration("10Y"), 8.0);
        assert_eq!(duration("30Y"), 18.0);
        assert_eq!(duration("5Y10Y"), 8.0);
        assert_eq!(duration("4Y"), DEFAULT_DURATION);
        assert_eq!(duration("???"), DEFAULT_DURATION);
    }

    #[test]
    fn test_compare_orders_curve_then_unknown() {
        let mut tenors = vec!["30Y", "5Y10Y", "2Y", "ABC", "3M", "10Y"];
        tenors.sort_by(|a, b| compare(a, b));
        assert_eq!(tenors, vec!["3M", "2Y", "10Y", "30Y", "5Y10Y", "ABC"]);
    }
}
