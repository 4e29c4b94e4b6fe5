//! Sleep record adapter
//!
//! Maps relay sleep records to canonical metrics. Stage durations arrive in
//! seconds and are converted to whole minutes; zero or negative durations
//! mean "no data" and become absent.

use super::{
    first_positive, number_field, positive, resolve_timestamp, seconds_to_minutes,
    ExtractedRecord, RecordAdapter, RecordIssue,
};
use crate::types::{
    SeriesKind, METRIC_AVERAGE_HR, METRIC_AVERAGE_HRV, METRIC_AWAKE, METRIC_DEEP_SLEEP,
    METRIC_DURATION, METRIC_EFFICIENCY, METRIC_LATENCY, METRIC_LIGHT_SLEEP, METRIC_LOWEST_HR,
    METRIC_REM_SLEEP, METRIC_SCORE,
};
use chrono::FixedOffset;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Date fields tried, in order, when a record has no `timestamp`
const DATE_FIELDS: &[&str] = &["day", "bedtime_start"];

/// Sleep adapter
pub struct SleepAdapter;

impl RecordAdapter for SleepAdapter {
    fn kind(&self) -> SeriesKind {
        SeriesKind::Sleep
    }

    fn extract(
        &self,
        record: &Map<String, Value>,
        zone: &FixedOffset,
    ) -> Result<ExtractedRecord, RecordIssue> {
        let time =
            resolve_timestamp(record, DATE_FIELDS, zone).ok_or(RecordIssue::BadTimestamp)?;

        let mut metrics = BTreeMap::new();
        metrics.insert(METRIC_SCORE.to_string(), number_field(record, "score"));
        metrics.insert(
            METRIC_DURATION.to_string(),
            seconds_to_minutes(first_positive(record, &["total_sleep_duration", "duration"])),
        );

        for (key, field) in [
            (METRIC_DEEP_SLEEP, "deep_sleep_duration"),
            (METRIC_REM_SLEEP, "rem_sleep_duration"),
            (METRIC_LIGHT_SLEEP, "light_sleep_duration"),
            (METRIC_AWAKE, "awake_time"),
            (METRIC_LATENCY, "latency"),
        ] {
            metrics.insert(
                key.to_string(),
                seconds_to_minutes(number_field(record, field)),
            );
        }

        metrics.insert(
            METRIC_EFFICIENCY.to_string(),
            positive(number_field(record, "efficiency")),
        );
        for key in [METRIC_AVERAGE_HR, METRIC_LOWEST_HR, METRIC_AVERAGE_HRV] {
            metrics.insert(key.to_string(), positive(number_field(record, key)));
        }

        Ok(ExtractedRecord { time, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn extract(value: Value, zone: FixedOffset) -> Result<ExtractedRecord, RecordIssue> {
        match value {
            Value::Object(map) => SleepAdapter.extract(&map, &zone),
            _ => panic!("expected object"),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_extract_sleep_record() {
        let extracted = extract(
            json!({
                "day": "2024-01-15",
                "score": 85,
                "total_sleep_duration": 27000,
                "deep_sleep_duration": 3600,
                "rem_sleep_duration": 0,
                "light_sleep_duration": -60,
                "efficiency": 93
            }),
            utc(),
        )
        .unwrap();

        assert!(extracted.time.anchored);
        assert_eq!(extracted.metrics[METRIC_SCORE], Some(85.0));
        assert_eq!(extracted.metrics[METRIC_DURATION], Some(450.0));
        assert_eq!(extracted.metrics[METRIC_DEEP_SLEEP], Some(60.0));
        assert_eq!(extracted.metrics[METRIC_REM_SLEEP], None);
        assert_eq!(extracted.metrics[METRIC_LIGHT_SLEEP], None);
        assert_eq!(extracted.metrics[METRIC_EFFICIENCY], Some(93.0));
        assert_eq!(extracted.metrics[METRIC_LATENCY], None);
    }

    #[test]
    fn test_duration_fallback_field() {
        let extracted = extract(
            json!({"day": "2024-01-15", "total_sleep_duration": 0, "duration": 25200}),
            utc(),
        )
        .unwrap();
        assert_eq!(extracted.metrics[METRIC_DURATION], Some(420.0));
    }

    #[test]
    fn test_bedtime_start_anchors_to_local_noon() {
        // Just before midnight in New York is already the next day in UTC
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let extracted = extract(
            json!({"bedtime_start": "2024-01-14T23:30:00-05:00", "score": 80}),
            zone,
        )
        .unwrap();

        assert!(extracted.time.anchored);
        let local = extracted.time.instant.with_timezone(&zone);
        assert_eq!(
            local.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap()
        );
        assert_eq!(local.format("%H:%M").to_string(), "12:00");
        assert_eq!(
            extracted.time.instant,
            "2024-01-14T17:00:00Z".parse::<chrono::DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_day_preferred_over_bedtime_start() {
        let extracted = extract(
            json!({
                "day": "2024-01-15",
                "bedtime_start": "2024-01-14T22:00:00+00:00",
                "score": 80
            }),
            utc(),
        )
        .unwrap();
        assert_eq!(
            extracted.time.instant.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_missing_dates() {
        assert_eq!(
            extract(json!({"score": 80}), utc()).unwrap_err(),
            RecordIssue::BadTimestamp
        );
    }
}
