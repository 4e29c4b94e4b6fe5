//! Sample normalization
//!
//! This module turns upstream relay records into canonical samples:
//! - field aliases and units resolved by the per-kind adapters
//! - the plotted metric chosen as the sample's primary value
//! - records with unreadable timestamps or values dropped and counted
//! - output sorted by timestamp

use crate::adapters::{adapter_for, RecordIssue};
use crate::types::{
    CanonicalSample, NormalizeReport, Normalized, SeriesKind, UpstreamRecord, PRIMARY_VALUE_KEY,
};
use chrono::FixedOffset;
use tracing::{debug, warn};

/// Normalizer for converting upstream records to canonical samples
pub struct Normalizer;

impl Normalizer {
    /// Normalize records using the kind's primary metric (BPM or sleep score)
    pub fn normalize(kind: SeriesKind, raw: &[UpstreamRecord], zone: &FixedOffset) -> Normalized {
        Self::normalize_metric(kind, raw, zone, kind.primary_metric())
    }

    /// Normalize records, using `value_key` as each sample's primary value.
    ///
    /// Never fails: a record that cannot be read is dropped and counted in the
    /// returned report.
    pub fn normalize_metric(
        kind: SeriesKind,
        raw: &[UpstreamRecord],
        zone: &FixedOffset,
        value_key: &str,
    ) -> Normalized {
        let adapter = adapter_for(kind);
        let value_key = if value_key == PRIMARY_VALUE_KEY {
            kind.primary_metric()
        } else {
            value_key
        };

        let mut report = NormalizeReport {
            total: raw.len(),
            ..Default::default()
        };
        let mut samples = Vec::with_capacity(raw.len());

        for record in raw {
            let extracted = match record.as_object() {
                Some(obj) => adapter.extract(obj, zone),
                None => Err(RecordIssue::NotAnObject),
            };

            let extracted = match extracted {
                Ok(extracted) => extracted,
                Err(issue) => {
                    count_issue(&mut report, issue);
                    continue;
                }
            };

            let Some(value) = extracted.metrics.get(value_key).copied().flatten() else {
                count_issue(&mut report, RecordIssue::MissingValue);
                continue;
            };

            if extracted.time.anchored {
                report.anchored += 1;
            }

            samples.push(CanonicalSample {
                timestamp: extracted.time.instant,
                value,
                metrics: extracted.metrics,
            });
        }

        // Stable, so equal timestamps keep upstream order
        samples.sort_by_key(|s| s.timestamp);

        if report.dropped() > 0 {
            warn!(
                kind = kind.as_str(),
                dropped = report.dropped(),
                bad_timestamp = report.bad_timestamp,
                missing_value = report.missing_value,
                total = report.total,
                "dropped malformed upstream records"
            );
        }
        debug!(
            kind = kind.as_str(),
            samples = samples.len(),
            anchored = report.anchored,
            "normalized series"
        );

        Normalized { samples, report }
    }
}

fn count_issue(report: &mut NormalizeReport, issue: RecordIssue) {
    match issue {
        RecordIssue::BadTimestamp => report.bad_timestamp += 1,
        RecordIssue::MissingValue => report.missing_value += 1,
        RecordIssue::NotAnObject => report.not_object += 1,
    }
}

/// Re-project samples so that `value` holds the metric `key`.
///
/// Samples where the metric is absent are left out, so a chart of deep sleep
/// never plots nights without stage data as zero. `"value"` keeps the current
/// primary value.
pub fn select_metric(samples: &[CanonicalSample], key: &str) -> Vec<CanonicalSample> {
    if key == PRIMARY_VALUE_KEY {
        return samples.to_vec();
    }

    samples
        .iter()
        .filter_map(|sample| {
            let value = sample.metric(key)?;
            Some(CanonicalSample {
                timestamp: sample.timestamp,
                value,
                metrics: sample.metrics.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{METRIC_DEEP_SLEEP, METRIC_DURATION, METRIC_SCORE};
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn sleep_records() -> Vec<UpstreamRecord> {
        vec![
            json!({
                "day": "2024-01-16",
                "score": 78,
                "total_sleep_duration": 25200,
                "deep_sleep_duration": 0
            }),
            json!({
                "day": "2024-01-15",
                "score": 85,
                "total_sleep_duration": 27000,
                "deep_sleep_duration": 3600
            }),
            json!({"day": "not-a-date", "score": 70}),
            json!("garbage"),
        ]
    }

    #[test]
    fn test_empty_input() {
        let normalized = Normalizer::normalize(SeriesKind::Heartrate, &[], &utc());
        assert!(normalized.samples.is_empty());
        assert_eq!(normalized.report, NormalizeReport::default());
    }

    #[test]
    fn test_normalize_sleep_sorts_and_counts() {
        let normalized = Normalizer::normalize(SeriesKind::Sleep, &sleep_records(), &utc());

        assert_eq!(normalized.samples.len(), 2);
        assert_eq!(normalized.samples[0].value, 85.0);
        assert_eq!(normalized.samples[1].value, 78.0);
        assert_eq!(normalized.report.total, 4);
        assert_eq!(normalized.report.bad_timestamp, 1);
        assert_eq!(normalized.report.not_object, 1);
        assert_eq!(normalized.report.dropped(), 2);
        assert_eq!(normalized.report.anchored, 2);
    }

    #[test]
    fn test_unit_conversion() {
        let records = vec![json!({
            "day": "2024-01-15",
            "score": 80,
            "total_sleep_duration": 3600,
            "deep_sleep_duration": -5
        })];
        let normalized = Normalizer::normalize(SeriesKind::Sleep, &records, &utc());
        let sample = &normalized.samples[0];

        assert_eq!(sample.metric(METRIC_DURATION), Some(60.0));
        assert_eq!(sample.metric(METRIC_DEEP_SLEEP), None);
        assert_eq!(sample.metrics.get(METRIC_DEEP_SLEEP), Some(&None));
    }

    #[test]
    fn test_normalize_metric_drops_absent_primary() {
        let normalized = Normalizer::normalize_metric(
            SeriesKind::Sleep,
            &sleep_records(),
            &utc(),
            METRIC_DEEP_SLEEP,
        );

        assert_eq!(normalized.samples.len(), 1);
        assert_eq!(normalized.samples[0].value, 60.0);
        assert_eq!(normalized.report.missing_value, 1);
    }

    #[test]
    fn test_heart_rate_missing_bpm_dropped() {
        let records = vec![
            json!({"bpm": 60, "timestamp": "2024-01-15T10:00:00Z"}),
            json!({"timestamp": "2024-01-15T10:05:00Z"}),
        ];
        let normalized = Normalizer::normalize(SeriesKind::Heartrate, &records, &utc());

        assert_eq!(normalized.samples.len(), 1);
        assert_eq!(normalized.report.missing_value, 1);
    }

    #[test]
    fn test_select_metric() {
        let normalized = Normalizer::normalize(SeriesKind::Sleep, &sleep_records(), &utc());

        let durations = select_metric(&normalized.samples, METRIC_DURATION);
        assert_eq!(
            durations.iter().map(|s| s.value).collect::<Vec<_>>(),
            vec![450.0, 420.0]
        );

        let deep = select_metric(&normalized.samples, METRIC_DEEP_SLEEP);
        assert_eq!(deep.len(), 1);

        let same = select_metric(&normalized.samples, PRIMARY_VALUE_KEY);
        assert_eq!(same, normalized.samples);

        let scores = select_metric(&normalized.samples, METRIC_SCORE);
        assert_eq!(scores, normalized.samples);
    }
}
