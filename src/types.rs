//! Core types for the VitalView pipeline
//!
//! This module defines the data structures that flow through each stage:
//! upstream records, canonical samples and aggregated buckets.

use crate::error::ChartError;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw record as returned by the relay. Field names vary by series kind
/// and vendor API version, so records stay untyped until normalization.
pub type UpstreamRecord = serde_json::Value;

/// Primary metric key for heart-rate series
pub const METRIC_BPM: &str = "bpm";
/// Primary metric key for sleep series
pub const METRIC_SCORE: &str = "score";
/// Total sleep duration (minutes)
pub const METRIC_DURATION: &str = "duration";
/// Deep sleep duration (minutes)
pub const METRIC_DEEP_SLEEP: &str = "deep_sleep_duration";
/// REM sleep duration (minutes)
pub const METRIC_REM_SLEEP: &str = "rem_sleep_duration";
/// Light sleep duration (minutes)
pub const METRIC_LIGHT_SLEEP: &str = "light_sleep_duration";
/// Awake time during the sleep period (minutes)
pub const METRIC_AWAKE: &str = "awake_time";
/// Sleep latency (minutes)
pub const METRIC_LATENCY: &str = "latency";
/// Sleep efficiency (percent)
pub const METRIC_EFFICIENCY: &str = "efficiency";
/// Average heart rate during sleep (bpm)
pub const METRIC_AVERAGE_HR: &str = "average_heart_rate";
/// Lowest heart rate during sleep (bpm)
pub const METRIC_LOWEST_HR: &str = "lowest_heart_rate";
/// Average HRV during sleep (ms)
pub const METRIC_AVERAGE_HRV: &str = "average_hrv";

/// Key that always addresses a sample's primary value
pub const PRIMARY_VALUE_KEY: &str = "value";

/// Kind of series fetched from the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    #[serde(alias = "heart_rate")]
    Heartrate,
    Sleep,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Heartrate => "heartrate",
            SeriesKind::Sleep => "sleep",
        }
    }

    /// Metric carried in `CanonicalSample::value` for this kind
    pub fn primary_metric(&self) -> &'static str {
        match self {
            SeriesKind::Heartrate => METRIC_BPM,
            SeriesKind::Sleep => METRIC_SCORE,
        }
    }

    /// Human readable name used in loading and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            SeriesKind::Heartrate => "heart rate",
            SeriesKind::Sleep => "sleep",
        }
    }
}

impl std::str::FromStr for SeriesKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heartrate" | "heart_rate" | "hr" => Ok(SeriesKind::Heartrate),
            "sleep" => Ok(SeriesKind::Sleep),
            other => Err(ChartError::ConfigError(format!(
                "unknown series kind: {other}"
            ))),
        }
    }
}

/// Canonical time-series sample, unit- and shape-consistent across sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSample {
    /// Sample instant (UTC)
    pub timestamp: DateTime<Utc>,
    /// Primary metric (BPM, sleep score, or the metric chosen by `select_metric`)
    pub value: f64,
    /// Metric-specific fields. `None` means "no data", never zero.
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl CanonicalSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            metrics: BTreeMap::new(),
        }
    }

    /// Attach a metric value
    pub fn with_metric(mut self, key: &str, value: Option<f64>) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }

    /// Look up a metric, treating the primary key as `value`
    pub fn metric(&self, key: &str) -> Option<f64> {
        if key == PRIMARY_VALUE_KEY {
            return Some(self.value);
        }
        self.metrics.get(key).copied().flatten()
    }
}

/// A time bucket produced by the granularity aggregator.
///
/// Structurally a superset of [`CanonicalSample`]: at the finest granularity
/// each sample maps to one bucket with no statistics attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    /// Bucket start, normalized to the bucket boundary
    pub timestamp: DateTime<Utc>,
    /// Rounded mean of the constituent primary values
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub count: Option<usize>,
    /// Per-metric means over the constituents that carry the metric
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl AggregatedBucket {
    /// Whether this bucket summarizes several samples (carries statistics)
    pub fn is_aggregated(&self) -> bool {
        self.count.is_some()
    }

    /// Lowest value the bucket spans, used for the y domain
    pub fn low(&self) -> f64 {
        self.min_value.unwrap_or(self.value)
    }

    /// Highest value the bucket spans, used for the y domain
    pub fn high(&self) -> f64 {
        self.max_value.unwrap_or(self.value)
    }
}

impl From<CanonicalSample> for AggregatedBucket {
    fn from(sample: CanonicalSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            value: sample.value,
            min_value: None,
            max_value: None,
            count: None,
            metrics: sample.metrics,
        }
    }
}

/// Diagnostics collected while normalizing a batch of upstream records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Records seen
    pub total: usize,
    /// Records dropped because the timestamp could not be parsed
    pub bad_timestamp: usize,
    /// Records dropped because the primary value was missing or non-numeric
    pub missing_value: usize,
    /// Entries dropped because they were not JSON objects
    pub not_object: usize,
    /// Records whose timestamp was anchored to local noon of a date field
    pub anchored: usize,
}

impl NormalizeReport {
    /// Total records dropped
    pub fn dropped(&self) -> usize {
        self.bad_timestamp + self.missing_value + self.not_object
    }
}

/// Output of the sample normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub samples: Vec<CanonicalSample>,
    pub report: NormalizeReport,
}

/// Parse a UTC offset such as `+02:00`, `-0530`, `Z` or `UTC`
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ChartError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" || trimmed.is_empty() {
        return Ok(utc_zone());
    }

    let (sign, rest) = match trimmed.as_bytes()[0] {
        b'+' => (1, &trimmed[1..]),
        b'-' => (-1, &trimmed[1..]),
        _ => return Err(ChartError::InvalidOffset(s.to_string())),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChartError::InvalidOffset(s.to_string()));
    }

    let hours: i32 = digits[..2]
        .parse()
        .map_err(|_| ChartError::InvalidOffset(s.to_string()))?;
    let minutes: i32 = digits[2..]
        .parse()
        .map_err(|_| ChartError::InvalidOffset(s.to_string()))?;
    if minutes >= 60 {
        return Err(ChartError::InvalidOffset(s.to_string()));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| ChartError::InvalidOffset(s.to_string()))
}

/// UTC as a fixed offset
pub fn utc_zone() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+02:00").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19800);
        assert!(parse_utc_offset("02:00").is_err());
        assert!(parse_utc_offset("+2").is_err());
        assert!(parse_utc_offset("+01:75").is_err());
    }

    #[test]
    fn test_metric_lookup() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let sample = CanonicalSample::new(ts, 85.0)
            .with_metric(METRIC_DURATION, Some(450.0))
            .with_metric(METRIC_DEEP_SLEEP, None);

        assert_eq!(sample.metric(PRIMARY_VALUE_KEY), Some(85.0));
        assert_eq!(sample.metric(METRIC_DURATION), Some(450.0));
        assert_eq!(sample.metric(METRIC_DEEP_SLEEP), None);
        assert_eq!(sample.metric("unknown"), None);
    }

    #[test]
    fn test_bucket_serialization_skips_missing_stats() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let bucket = AggregatedBucket::from(CanonicalSample::new(ts, 62.0));
        let json = serde_json::to_value(&bucket).unwrap();

        assert_eq!(json["value"], 62.0);
        assert!(json.get("min_value").is_none());
        assert!(json.get("count").is_none());
        assert!(!bucket.is_aggregated());
    }

    #[test]
    fn test_series_kind_from_str() {
        assert_eq!("heartrate".parse::<SeriesKind>().unwrap(), SeriesKind::Heartrate);
        assert_eq!("Sleep".parse::<SeriesKind>().unwrap(), SeriesKind::Sleep);
        assert!("steps".parse::<SeriesKind>().is_err());
    }
}
