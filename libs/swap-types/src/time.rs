//! Timestamp parsing
//!
//! Execution timestamps are ISO-8601. Some publishers omit the offset;
//! those are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::TypeError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp, with or without an explicit offset.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TypeError> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(TypeError::InvalidTimestamp(text.to_string()))
}

/// Serde adapter for a required timestamp field.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}

/// Serde adapter for an optional timestamp field; unparsable text is absent.
pub fn deserialize_opt_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.and_then(|t| parse_timestamp(&t).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-05-02T12:15:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let ts = parse_timestamp("2024-05-02T10:15:30.250").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.nanosecond(), 250_000_000);

        let spaced = parse_timestamp("2024-05-02 10:15:30").unwrap();
        assert_eq!(spaced, Utc.with_ymd_and_hms(2024, 5, 2, 10, 15, 30).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("not a time"),
            Err(TypeError::InvalidTimestamp(_))
        ));
    }
}
