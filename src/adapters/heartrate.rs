//! Heart-rate record adapter
//!
//! Maps relay heart-rate records (`{"bpm": 62, "source": "awake",
//! "timestamp": "..."}`) to canonical metrics.

use super::{
    number_field, positive, resolve_timestamp, ExtractedRecord, RecordAdapter, RecordIssue,
};
use crate::types::{SeriesKind, METRIC_BPM};
use chrono::FixedOffset;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Heart-rate adapter
pub struct HeartRateAdapter;

impl RecordAdapter for HeartRateAdapter {
    fn kind(&self) -> SeriesKind {
        SeriesKind::Heartrate
    }

    fn extract(
        &self,
        record: &Map<String, Value>,
        zone: &FixedOffset,
    ) -> Result<ExtractedRecord, RecordIssue> {
        let time = resolve_timestamp(record, &["day"], zone).ok_or(RecordIssue::BadTimestamp)?;

        // Older relay versions forward the reading as `value`
        let bpm = positive(number_field(record, "bpm").or_else(|| number_field(record, "value")));

        let mut metrics = BTreeMap::new();
        metrics.insert(METRIC_BPM.to_string(), bpm);

        Ok(ExtractedRecord { time, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(value: Value) -> Result<ExtractedRecord, RecordIssue> {
        let zone = FixedOffset::east_opt(0).unwrap();
        match value {
            Value::Object(map) => HeartRateAdapter.extract(&map, &zone),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_extract_heart_rate() {
        let extracted = extract(json!({
            "bpm": 62,
            "source": "awake",
            "timestamp": "2024-01-15T10:00:00+00:00"
        }))
        .unwrap();

        assert!(!extracted.time.anchored);
        assert_eq!(extracted.metrics[METRIC_BPM], Some(62.0));
        assert_eq!(
            extracted.time.instant.to_rfc3339(),
            "2024-01-15T10:00:00+00:00"
        );
    }

    #[test]
    fn test_value_alias() {
        let extracted =
            extract(json!({"value": 71.0, "timestamp": "2024-01-15T10:00:00Z"})).unwrap();
        assert_eq!(extracted.metrics[METRIC_BPM], Some(71.0));
    }

    #[test]
    fn test_unreadable_bpm_is_absent() {
        let extracted =
            extract(json!({"bpm": "fast", "timestamp": "2024-01-15T10:00:00Z"})).unwrap();
        assert_eq!(extracted.metrics[METRIC_BPM], None);

        let extracted = extract(json!({"bpm": 0, "timestamp": "2024-01-15T10:00:00Z"})).unwrap();
        assert_eq!(extracted.metrics[METRIC_BPM], None);
    }

    #[test]
    fn test_bad_timestamp() {
        assert_eq!(
            extract(json!({"bpm": 62, "timestamp": "not a time"})).unwrap_err(),
            RecordIssue::BadTimestamp
        );
    }
}
