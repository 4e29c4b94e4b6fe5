//! Pipeline orchestration
//!
//! Stateless entry points that run a relay response through the whole chain:
//! envelope parsing → normalization → metric selection → aggregation, and
//! optionally on to a rendered chart.

use crate::adapters::parse_envelope;
use crate::aggregator::aggregate;
use crate::chart::TimeSeriesChart;
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::granularity::BucketWidth;
use crate::normalizer::Normalizer;
use crate::types::{AggregatedBucket, SeriesKind};
use chrono::FixedOffset;

/// Aggregate a raw relay response.
///
/// # Arguments
/// * `kind` - Series the response belongs to
/// * `raw_json` - Relay response body (bare array or `{"data": [...]}`)
/// * `value_key` - Metric to plot, `"value"` for the kind's primary metric
/// * `width` - Bucket width
/// * `zone` - Local zone for bucketing
///
/// # Example
/// ```ignore
/// let buckets = aggregate_series(
///     SeriesKind::Heartrate,
///     &body,
///     "bpm",
///     BucketWidth::Minutes(5),
///     &utc_zone(),
/// )?;
/// ```
pub fn aggregate_series(
    kind: SeriesKind,
    raw_json: &str,
    value_key: &str,
    width: BucketWidth,
    zone: &FixedOffset,
) -> Result<Vec<AggregatedBucket>, ChartError> {
    let records = parse_envelope(raw_json)?;
    let normalized = Normalizer::normalize_metric(kind, &records, zone, value_key);
    Ok(aggregate(&normalized.samples, width, zone))
}

/// Build a preset chart from a raw relay response.
///
/// `granularity` overrides the preset's initial granularity; `hover_x`
/// (plot-local pixels) resolves a hover as if the pointer sat there, at the
/// vertical middle of the plot.
pub fn chart_from_json(
    config: &ChartConfig,
    preset: &str,
    raw_json: &str,
    granularity: Option<&str>,
    hover_x: Option<f64>,
) -> Result<TimeSeriesChart, ChartError> {
    let kind = config.preset(preset)?.kind;
    let mut chart = config.chart(preset)?;

    let records = parse_envelope(raw_json)?;
    chart.set_records(kind, &records);
    if let Some(key) = granularity {
        chart.select_granularity(key)?;
    }
    if let Some(x) = hover_x {
        let y = config.layout.plot_height() / 2.0;
        chart.pointer_move(x, y);
    }
    Ok(chart)
}

/// Render a preset chart from a raw relay response to SVG
pub fn render_svg(
    config: &ChartConfig,
    preset: &str,
    raw_json: &str,
    granularity: Option<&str>,
    hover_x: Option<f64>,
) -> Result<String, ChartError> {
    chart_from_json(config, preset, raw_json, granularity, hover_x)?.render_svg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hover::HoverState;
    use crate::types::utc_zone;

    const HEART_RATE: &str = r#"{"data": [
        {"timestamp": "2024-01-15T10:00:00Z", "bpm": 60},
        {"timestamp": "2024-01-15T10:05:00Z", "bpm": 64},
        {"timestamp": "2024-01-15T10:10:00Z", "bpm": 58},
        {"timestamp": "2024-01-15T10:14:00Z", "bpm": 62},
        {"timestamp": "not a date", "bpm": 70}
    ]}"#;

    #[test]
    fn test_aggregate_series() {
        let buckets = aggregate_series(
            SeriesKind::Heartrate,
            HEART_RATE,
            "value",
            BucketWidth::Minutes(5),
            &utc_zone(),
        )
        .unwrap();

        let summary: Vec<_> = buckets.iter().map(|b| (b.value, b.count)).collect();
        assert_eq!(summary, vec![(60.0, Some(1)), (64.0, Some(1)), (60.0, Some(2))]);
    }

    #[test]
    fn test_invalid_envelope() {
        let err = aggregate_series(
            SeriesKind::Heartrate,
            r#"{"items": []}"#,
            "value",
            BucketWidth::FINEST,
            &utc_zone(),
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::InvalidResponse(_)));
    }

    #[test]
    fn test_chart_from_json_with_hover() {
        let config = ChartConfig::default();
        let chart =
            chart_from_json(&config, "heart_rate", HEART_RATE, Some("5min"), Some(0.0)).unwrap();

        assert_eq!(chart.data().len(), 3);
        assert_eq!(chart.hover(), HoverState::Hovering { index: 0 });

        let svg = render_svg(&config, "heart_rate", HEART_RATE, None, None).unwrap();
        assert!(svg.contains("Heart Rate"));
        assert!(!svg.contains("Heart Rate Details"));
    }

    #[test]
    fn test_unknown_granularity_is_reported() {
        let config = ChartConfig::default();
        let err = chart_from_json(&config, "heart_rate", HEART_RATE, Some("weekly"), None)
            .unwrap_err();
        assert!(matches!(err, ChartError::UnknownGranularity(_)));
    }
}
