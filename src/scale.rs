//! Scale engine
//!
//! Continuous mappings from the data domain to plot pixels: time to x, value
//! to y (inverted, screen y grows downward). Scales are plain affine
//! transforms recomputed on every data or size change.

use crate::types::AggregatedBucket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Padding added above and below the value extent, in the metric's unit
pub const VALUE_PADDING: f64 = 5.0;

/// Smallest time domain width, so a single point never divides by zero
pub const MIN_TIME_SPAN_MS: i64 = 1;

/// Linear time scale: `[start, start + span]` → `[0, width]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    start_ms: i64,
    span_ms: i64,
    width: f64,
}

impl TimeScale {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, width: f64) -> Self {
        let start_ms = start.timestamp_millis();
        let span_ms = (end.timestamp_millis() - start_ms).max(MIN_TIME_SPAN_MS);
        Self {
            start_ms,
            span_ms,
            width,
        }
    }

    /// Pixel x of an instant
    pub fn map(&self, t: &DateTime<Utc>) -> f64 {
        let offset = (t.timestamp_millis() - self.start_ms) as f64;
        offset / self.span_ms as f64 * self.width
    }

    /// Instant at pixel x
    pub fn invert(&self, x: f64) -> Option<DateTime<Utc>> {
        let ms = self.start_ms as f64 + x / self.width * self.span_ms as f64;
        DateTime::from_timestamp_millis(ms.round() as i64)
    }

    pub fn domain_start(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_ms)
    }

    pub fn span_ms(&self) -> i64 {
        self.span_ms
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// `count` evenly spaced instants across the domain, ends included.
    ///
    /// A single instant when the domain is degenerate.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        if count < 2 || self.span_ms <= MIN_TIME_SPAN_MS {
            return self.domain_start().into_iter().collect();
        }
        let step = self.span_ms as f64 / (count - 1) as f64;
        (0..count)
            .filter_map(|i| {
                DateTime::from_timestamp_millis(self.start_ms + (step * i as f64).round() as i64)
            })
            .collect()
    }
}

/// Linear value scale: `[d0, d1]` → `[r0, r1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (px - r0) / span * (d1 - d0)
    }

    /// Round tick values (1, 2 or 5 times a power of ten) inside the domain
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if count == 0 || !(hi > lo) || !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }

        let step = nice_step((hi - lo) / count as f64);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Step of the form {1, 2, 5} × 10^k nearest to `raw`
fn nice_step(raw: f64) -> f64 {
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 7.07 {
        10.0
    } else if error >= 3.16 {
        5.0
    } else if error >= 1.41 {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Scales for one render pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub x: TimeScale,
    pub y: LinearScale,
    pub plot_width: f64,
    pub plot_height: f64,
}

/// Derive scales from aggregated data.
///
/// Returns `None` for empty data: there is no domain to map, and callers draw
/// the no-data placeholder instead.
pub fn compute_scales(
    data: &[AggregatedBucket],
    plot_width: f64,
    plot_height: f64,
) -> Option<ChartGeometry> {
    let first = data.first()?;

    let (mut t_min, mut t_max) = (first.timestamp, first.timestamp);
    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for bucket in data {
        t_min = t_min.min(bucket.timestamp);
        t_max = t_max.max(bucket.timestamp);
        v_min = v_min.min(bucket.low());
        v_max = v_max.max(bucket.high());
    }

    Some(ChartGeometry {
        x: TimeScale::new(t_min, t_max, plot_width),
        y: LinearScale::new(
            (v_min - VALUE_PADDING, v_max + VALUE_PADDING),
            (plot_height, 0.0),
        ),
        plot_width,
        plot_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalSample;
    use chrono::TimeZone;

    fn bucket(minute: u32, value: f64) -> AggregatedBucket {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap();
        AggregatedBucket::from(CanonicalSample::new(ts, value))
    }

    #[test]
    fn test_empty_data_has_no_geometry() {
        assert!(compute_scales(&[], 500.0, 250.0).is_none());
    }

    #[test]
    fn test_x_scale_spans_plot() {
        let data = vec![bucket(0, 60.0), bucket(10, 64.0), bucket(20, 58.0)];
        let geometry = compute_scales(&data, 600.0, 250.0).unwrap();

        assert_eq!(geometry.x.map(&data[0].timestamp), 0.0);
        assert_eq!(geometry.x.map(&data[1].timestamp), 300.0);
        assert_eq!(geometry.x.map(&data[2].timestamp), 600.0);
        assert_eq!(geometry.x.invert(300.0), Some(data[1].timestamp));
    }

    #[test]
    fn test_y_scale_padded_and_inverted() {
        let mut wide = bucket(5, 60.0);
        wide.min_value = Some(50.0);
        wide.max_value = Some(70.0);
        wide.count = Some(3);
        let data = vec![bucket(0, 62.0), wide];
        let geometry = compute_scales(&data, 600.0, 250.0).unwrap();

        assert_eq!(geometry.y.domain, (45.0, 75.0));
        assert_eq!(geometry.y.map(45.0), 250.0);
        assert_eq!(geometry.y.map(75.0), 0.0);
        assert!(geometry.y.map(70.0) < geometry.y.map(50.0));
        assert!((geometry.y.invert(125.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_does_not_divide_by_zero() {
        let data = vec![bucket(0, 60.0)];
        let geometry = compute_scales(&data, 600.0, 250.0).unwrap();

        assert_eq!(geometry.x.span_ms(), MIN_TIME_SPAN_MS);
        let x = geometry.x.map(&data[0].timestamp);
        assert!(x.is_finite());
        assert_eq!(x, 0.0);
        assert_eq!(geometry.y.domain, (55.0, 65.0));
        assert_eq!(geometry.x.ticks(5).len(), 1);
    }

    #[test]
    fn test_value_ticks_are_round() {
        let scale = LinearScale::new((45.0, 75.0), (250.0, 0.0));
        assert_eq!(
            scale.ticks(5),
            vec![45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0]
        );

        let scale = LinearScale::new((0.0, 1000.0), (100.0, 0.0));
        assert_eq!(scale.ticks(5), vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0]);
    }

    #[test]
    fn test_time_ticks_cover_domain() {
        let data = vec![bucket(0, 60.0), bucket(40, 64.0)];
        let geometry = compute_scales(&data, 400.0, 250.0).unwrap();
        let ticks = geometry.x.ticks(5);

        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0], data[0].timestamp);
        assert_eq!(ticks[4], data[1].timestamp);
        assert_eq!(geometry.x.map(&ticks[2]), 200.0);
    }
}
