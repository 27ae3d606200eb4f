//! Millisecond timestamps

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Instant in milliseconds since the Unix epoch.
///
/// Every stream is keyed on this resolution; finer parts of a source instant
/// are truncated during parsing so that two records in the same millisecond
/// land in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from epoch milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds.
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    ///
    /// Saturates at the `i64` bounds.
    pub const fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Epoch milliseconds, if they name an instant a calendar date can hold.
    fn representable(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|_| Self(millis))
    }

    /// Parse an RFC 3339 / ISO 8601 string.
    ///
    /// Strings without an offset are read as UTC.
    pub fn parse_str(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(parsed.timestamp_millis()));
        }

        const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| Self(naive.and_utc().timestamp_millis()))
    }

    /// Read a timestamp from a raw JSON value.
    ///
    /// Strings are parsed as dates; numbers are taken as epoch milliseconds.
    /// Numbers outside the calendar range are rejected rather than clamped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Self::parse_str(raw),
            Value::Number(number) => match number.as_i64() {
                Some(millis) => Self::representable(millis),
                None => number
                    .as_f64()
                    .map(f64::trunc)
                    .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .and_then(|f| Self::representable(f as i64)),
            },
            _ => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp_millis(self.0) {
            Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_dates_with_offset() {
        let ts = Timestamp::parse_str("2023-09-16T13:03:35.292000+00:00").unwrap();
        assert_eq!(ts.as_millis(), 1_694_869_415_292);
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let a = Timestamp::parse_str("2023-09-16T13:03:35.292999+00:00").unwrap();
        let b = Timestamp::parse_str("2023-09-16T13:03:35.292001+00:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn offsets_are_applied() {
        let utc = Timestamp::parse_str("2023-09-16T13:03:35+00:00").unwrap();
        let cest = Timestamp::parse_str("2023-09-16T15:03:35+02:00").unwrap();
        assert_eq!(utc, cest);
    }

    #[test]
    fn naive_dates_are_utc() {
        let naive = Timestamp::parse_str("2023-09-16T13:03:35.5").unwrap();
        let zulu = Timestamp::parse_str("2023-09-16T13:03:35.500Z").unwrap();
        assert_eq!(naive, zulu);
    }

    #[test]
    fn numbers_are_epoch_millis() {
        assert_eq!(Timestamp::from_value(&json!(1000)), Some(Timestamp::from_millis(1000)));
        assert_eq!(Timestamp::from_value(&json!(1000.9)), Some(Timestamp::from_millis(1000)));
    }

    #[test]
    fn rejects_unusable_values() {
        assert_eq!(Timestamp::from_value(&json!(null)), None);
        assert_eq!(Timestamp::from_value(&json!("")), None);
        assert_eq!(Timestamp::from_value(&json!("yesterday")), None);
        assert_eq!(Timestamp::from_value(&json!(true)), None);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert_eq!(Timestamp::from_value(&json!(i64::MIN)), None);
        assert_eq!(Timestamp::from_value(&json!(i64::MAX)), None);
        assert_eq!(Timestamp::from_value(&json!(u64::MAX)), None);
        assert_eq!(Timestamp::from_value(&json!(-1e300)), None);
        assert_eq!(Timestamp::from_value(&json!(1e300)), None);
        assert_eq!(Timestamp::from_value(&json!(-1000.5)), Some(Timestamp::from_millis(-1000)));
    }

    #[test]
    fn millis_since_saturates() {
        let early = Timestamp::from_millis(i64::MIN);
        let late = Timestamp::from_millis(i64::MAX);
        assert_eq!(late.millis_since(early), i64::MAX);
        assert_eq!(early.millis_since(late), i64::MIN);
        assert_eq!(Timestamp::from_millis(1500).millis_since(Timestamp::from_millis(500)), 1000);
    }

    #[test]
    fn display_is_iso() {
        assert_eq!(Timestamp::from_millis(1500).to_string(), "1970-01-01T00:00:01.500Z");
    }
}
