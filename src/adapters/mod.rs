//! Upstream record adapters
//!
//! This module provides adapters that read raw relay records (untyped JSON
//! objects) and map them to canonical samples, plus the shared field helpers
//! every adapter uses for timestamps, numbers and durations.

mod heartrate;
mod sleep;

pub use heartrate::HeartRateAdapter;
pub use sleep::SleepAdapter;

use crate::error::ChartError;
use crate::types::{SeriesKind, UpstreamRecord};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Hour of day used when a record only carries a calendar date
pub const DATE_ANCHOR_HOUR: u32 = 12;

/// Why a single record could not become a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssue {
    /// No timestamp field, or none that parses to a valid instant
    BadTimestamp,
    /// The primary metric is absent or not a number
    MissingValue,
    /// The record is not a JSON object
    NotAnObject,
}

/// Timestamp resolved from a record, and whether it came from a bare date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    pub instant: DateTime<Utc>,
    pub anchored: bool,
}

/// Fields read from one upstream record, before a primary metric is chosen
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub time: ResolvedTime,
    /// Metrics in canonical units; `None` marks absent data
    pub metrics: BTreeMap<String, Option<f64>>,
}

/// Trait for per-kind record adapters
pub trait RecordAdapter {
    /// Series kind this adapter understands
    fn kind(&self) -> SeriesKind;

    /// Read the timestamp and metrics of one upstream object
    fn extract(
        &self,
        record: &Map<String, Value>,
        zone: &FixedOffset,
    ) -> Result<ExtractedRecord, RecordIssue>;
}

/// Adapter for a series kind
pub fn adapter_for(kind: SeriesKind) -> &'static dyn RecordAdapter {
    match kind {
        SeriesKind::Heartrate => &HeartRateAdapter,
        SeriesKind::Sleep => &SleepAdapter,
    }
}

/// Parse a relay response body into its records.
///
/// Accepts a bare JSON array or the relay envelope `{"data": [...]}`.
pub fn parse_envelope(json: &str) -> Result<Vec<UpstreamRecord>, ChartError> {
    let value: Value = serde_json::from_str(json)?;
    records_from_value(value)
}

/// Extract the record list from an already parsed relay response
pub fn records_from_value(value: Value) -> Result<Vec<UpstreamRecord>, ChartError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ChartError::InvalidResponse(
                "`data` is not an array".to_string(),
            )),
            None => Err(ChartError::InvalidResponse(
                "missing `data` field".to_string(),
            )),
        },
        _ => Err(ChartError::InvalidResponse(
            "expected an array or an object".to_string(),
        )),
    }
}

/// Read a numeric field; numeric strings are accepted, everything else is `None`
pub(crate) fn number_field(record: &Map<String, Value>, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// First numeric field among `keys` that is present and positive.
///
/// Mirrors the upstream `a || b` fallback, where a zero in the first field
/// falls through to the second.
pub(crate) fn first_positive(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| number_field(record, key))
        .find(|v| *v > 0.0)
}

/// Convert a duration in seconds to whole minutes.
///
/// Zero or negative durations mean the vendor had no data and become `None`.
pub(crate) fn seconds_to_minutes(seconds: Option<f64>) -> Option<f64> {
    let minutes = (seconds? / 60.0).round();
    (minutes > 0.0).then_some(minutes)
}

/// Positive values only; zero is not a meaningful physiological reading
pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Resolve a record's instant from `timestamp`, falling back to date fields.
///
/// Full date-times are taken as-is (naive ones are read in `zone`). Date-only
/// values are anchored at local noon in `zone` so that converting between
/// zones never moves the sample onto a neighbouring day.
pub(crate) fn resolve_timestamp(
    record: &Map<String, Value>,
    date_fallbacks: &[&str],
    zone: &FixedOffset,
) -> Option<ResolvedTime> {
    if let Some(raw) = record.get("timestamp").filter(|v| !v.is_null()) {
        return match raw {
            Value::String(s) => parse_instant(s, zone),
            // Epoch seconds
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|instant| ResolvedTime {
                    instant,
                    anchored: false,
                }),
            _ => None,
        };
    }

    date_fallbacks.iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) => local_date_of(s, zone).and_then(|d| anchor_date(d, zone)),
        _ => None,
    })
}

/// Parse an RFC 3339 instant, a naive date-time, or a bare date
pub(crate) fn parse_instant(s: &str, zone: &FixedOffset) -> Option<ResolvedTime> {
    let s = s.trim();
    if !s.contains('T') && !s.contains(' ') {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        return anchor_date(date, zone);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ResolvedTime {
            instant: dt.with_timezone(&Utc),
            anchored: false,
        });
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| zone.from_local_datetime(&naive).single())
        .map(|dt| ResolvedTime {
            instant: dt.with_timezone(&Utc),
            anchored: false,
        })
}

/// Calendar date of a date or date-time string, as seen in `zone`
fn local_date_of(s: &str, zone: &FixedOffset) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(zone).date_naive());
    }
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Local noon of `date` in `zone`
fn anchor_date(date: NaiveDate, zone: &FixedOffset) -> Option<ResolvedTime> {
    let noon = NaiveTime::from_hms_opt(DATE_ANCHOR_HOUR, 0, 0)?;
    zone.from_local_datetime(&date.and_time(noon))
        .single()
        .map(|dt| ResolvedTime {
            instant: dt.with_timezone(&Utc),
            anchored: true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_envelope_shapes() {
        let wrapped = parse_envelope(r#"{"data": [{"bpm": 60}], "next_token": null}"#).unwrap();
        assert_eq!(wrapped.len(), 1);

        let bare = parse_envelope(r#"[{"bpm": 60}, {"bpm": 61}]"#).unwrap();
        assert_eq!(bare.len(), 2);

        assert!(matches!(
            parse_envelope(r#"{"items": []}"#),
            Err(ChartError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_envelope(r#"{"data": 3}"#),
            Err(ChartError::InvalidResponse(_))
        ));
        assert!(matches!(parse_envelope("nope"), Err(ChartError::JsonError(_))));
    }

    #[test]
    fn test_seconds_to_minutes() {
        assert_eq!(seconds_to_minutes(Some(3600.0)), Some(60.0));
        assert_eq!(seconds_to_minutes(Some(89.0)), Some(1.0));
        assert_eq!(seconds_to_minutes(Some(0.0)), None);
        assert_eq!(seconds_to_minutes(Some(-120.0)), None);
        assert_eq!(seconds_to_minutes(Some(20.0)), None);
        assert_eq!(seconds_to_minutes(None), None);
    }

    #[test]
    fn test_number_field_accepts_numeric_strings() {
        let record = obj(json!({"a": 5, "b": "7.5", "c": "x", "d": null}));
        assert_eq!(number_field(&record, "a"), Some(5.0));
        assert_eq!(number_field(&record, "b"), Some(7.5));
        assert_eq!(number_field(&record, "c"), None);
        assert_eq!(number_field(&record, "d"), None);
        assert_eq!(number_field(&record, "missing"), None);
    }

    #[test]
    fn test_date_only_timestamp_anchors_to_local_noon() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let record = obj(json!({"timestamp": "2024-01-15"}));
        let resolved = resolve_timestamp(&record, &[], &zone).unwrap();

        assert!(resolved.anchored);
        assert_eq!(resolved.instant.to_rfc3339(), "2024-01-15T17:00:00+00:00");
        assert_eq!(
            resolved.instant.with_timezone(&zone).date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_naive_timestamp_read_in_zone() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let record = obj(json!({"timestamp": "2024-01-15T10:00:00"}));
        let resolved = resolve_timestamp(&record, &[], &zone).unwrap();

        assert!(!resolved.anchored);
        assert_eq!(resolved.instant.to_rfc3339(), "2024-01-15T08:00:00+00:00");
    }

    #[test]
    fn test_unparseable_timestamp() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let record = obj(json!({"timestamp": "yesterday-ish", "day": "2024-01-15"}));
        // An explicit but broken timestamp is not silently replaced by `day`
        assert!(resolve_timestamp(&record, &["day"], &zone).is_none());
        assert!(resolve_timestamp(&obj(json!({})), &["day"], &zone).is_none());
    }
}
