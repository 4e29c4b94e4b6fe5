//! Granularity aggregation
//!
//! Groups canonical samples into fixed-width time buckets in the chart's
//! local zone and summarizes each bucket with mean, min, max and count.

use crate::granularity::BucketWidth;
use crate::types::{AggregatedBucket, CanonicalSample};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use std::collections::{BTreeMap, HashMap};

/// Bucket key: local calendar date plus minutes past local midnight
type BucketKey = (NaiveDate, u32);

/// Aggregate samples into buckets of `width`.
///
/// The finest width is the identity. Output is sorted ascending by bucket
/// start, whatever the input order.
pub fn aggregate(
    samples: &[CanonicalSample],
    width: BucketWidth,
    zone: &FixedOffset,
) -> Vec<AggregatedBucket> {
    if width.is_finest() {
        return samples.iter().cloned().map(AggregatedBucket::from).collect();
    }

    let mut groups: HashMap<BucketKey, Vec<&CanonicalSample>> = HashMap::new();
    for sample in samples {
        groups
            .entry(bucket_key(&sample.timestamp, width, zone))
            .or_default()
            .push(sample);
    }

    let mut buckets: Vec<AggregatedBucket> = groups
        .into_iter()
        .filter_map(|(key, members)| {
            let start = bucket_start(key, zone)?;
            Some(summarize(start, &members))
        })
        .collect();

    buckets.sort_by_key(|b| b.timestamp);
    buckets
}

/// Bucket a single instant falls into
fn bucket_key(timestamp: &DateTime<Utc>, width: BucketWidth, zone: &FixedOffset) -> BucketKey {
    let local = timestamp.with_timezone(zone);
    match width {
        BucketWidth::Daily => (local.date_naive(), 0),
        BucketWidth::Minutes(w) => {
            let w = w.max(1);
            let minute_of_day = local.hour() * 60 + local.minute();
            (local.date_naive(), (minute_of_day / w) * w)
        }
    }
}

/// UTC instant of a bucket's local start
fn bucket_start((date, minutes): BucketKey, zone: &FixedOffset) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)?;
    zone.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Summarize one bucket.
///
/// Extrema are rounded like the mean so `min_value <= value <= max_value`
/// holds for fractional samples too.
fn summarize(start: DateTime<Utc>, members: &[&CanonicalSample]) -> AggregatedBucket {
    let count = members.len();
    let sum: f64 = members.iter().map(|s| s.value).sum();
    let min = members.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let max = members
        .iter()
        .map(|s| s.value)
        .fold(f64::NEG_INFINITY, f64::max);

    AggregatedBucket {
        timestamp: start,
        value: (sum / count as f64).round(),
        min_value: Some(min.round()),
        max_value: Some(max.round()),
        count: Some(count),
        metrics: metric_means(members),
    }
}

/// Mean of each metric over the members that carry it.
///
/// A metric that no member carries stays absent rather than averaging to zero.
fn metric_means(members: &[&CanonicalSample]) -> BTreeMap<String, Option<f64>> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for sample in members {
        for (key, value) in &sample.metrics {
            let entry = sums.entry(key.as_str()).or_insert((0.0, 0));
            if let Some(v) = value {
                entry.0 += v;
                entry.1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(key, (sum, n))| (key.to_string(), (n > 0).then(|| sum / n as f64)))
        .collect()
}

/// Local calendar date of a bucket, for daily labels
pub fn local_date(timestamp: &DateTime<Utc>, zone: &FixedOffset) -> NaiveDate {
    timestamp.with_timezone(zone).date_naive()
}

/// Number of distinct local days covered by `buckets`
pub fn distinct_days(buckets: &[AggregatedBucket], zone: &FixedOffset) -> usize {
    let mut days: Vec<(i32, u32)> = buckets
        .iter()
        .map(|b| {
            let d = local_date(&b.timestamp, zone);
            (d.year(), d.ordinal())
        })
        .collect();
    days.dedup();
    days.len()
}
