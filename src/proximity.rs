//! Proximity resolution
//!
//! Maps a pointer x-coordinate (plot-local pixels) to the nearest data point
//! for the hover tooltip.

use crate::scale::TimeScale;
use crate::types::AggregatedBucket;

/// Pointer distance beyond which no point is considered hovered, in pixels
pub const HOVER_THRESHOLD_PX: f64 = 50.0;

/// Nearest data point to a pointer position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a> {
    /// Index into the data slice
    pub index: usize,
    pub bucket: &'a AggregatedBucket,
    /// Absolute pixel distance along x
    pub distance: f64,
}

/// Find the point whose projected x is closest to `pointer_x`.
///
/// Returns `None` when the closest point is more than
/// [`HOVER_THRESHOLD_PX`] away. On exact ties the first point in `data` wins.
pub fn find_nearest<'a>(
    pointer_x: f64,
    data: &'a [AggregatedBucket],
    x_scale: &TimeScale,
) -> Option<Nearest<'a>> {
    find_nearest_within(pointer_x, data, x_scale, HOVER_THRESHOLD_PX)
}

/// [`find_nearest`] with an explicit threshold
pub fn find_nearest_within<'a>(
    pointer_x: f64,
    data: &'a [AggregatedBucket],
    x_scale: &TimeScale,
    threshold_px: f64,
) -> Option<Nearest<'a>> {
    if !pointer_x.is_finite() {
        return None;
    }

    let mut best: Option<Nearest<'a>> = None;
    for (index, bucket) in data.iter().enumerate() {
        let distance = (x_scale.map(&bucket.timestamp) - pointer_x).abs();
        // Strict comparison keeps the first of equally distant points
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Nearest {
                index,
                bucket,
                distance,
            });
        }
    }

    best.filter(|b| b.distance <= threshold_px)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalSample;
    use chrono::{TimeZone, Utc};

    fn data(minutes: &[u32]) -> Vec<AggregatedBucket> {
        minutes
            .iter()
            .map(|m| {
                let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
                    + chrono::Duration::minutes(*m as i64);
                AggregatedBucket::from(CanonicalSample::new(ts, 60.0 + *m as f64))
            })
            .collect()
    }

    fn scale(data: &[AggregatedBucket], width: f64) -> TimeScale {
        TimeScale::new(data[0].timestamp, data[data.len() - 1].timestamp, width)
    }

    #[test]
    fn test_nearest_point() {
        // Points at x = 0, 100, 200, ..., 1000
        let data = data(&[0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        let x = scale(&data, 1000.0);

        let hit = find_nearest(340.0, &data, &x).unwrap();
        assert_eq!(hit.index, 3);
        assert_eq!(hit.distance, 40.0);

        let hit = find_nearest(360.0, &data, &x).unwrap();
        assert_eq!(hit.index, 4);
    }

    #[test]
    fn test_threshold() {
        let data = data(&[0, 100]);
        let x = scale(&data, 1000.0);

        // Midpoint is 500px from both points
        assert!(find_nearest(500.0, &data, &x).is_none());
        // Outside the plot, in the margins
        assert!(find_nearest(-60.0, &data, &x).is_none());
        assert!(find_nearest(1051.0, &data, &x).is_none());
        // Exactly on the threshold still counts
        assert_eq!(find_nearest(1050.0, &data, &x).unwrap().index, 1);
    }

    #[test]
    fn test_tie_breaks_to_first() {
        let data = data(&[0, 10]);
        let x = scale(&data, 80.0);
        let hit = find_nearest(40.0, &data, &x).unwrap();
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn test_empty_and_invalid_pointer() {
        let d = data(&[0, 10]);
        let x = scale(&d, 100.0);
        assert!(find_nearest(10.0, &[], &x).is_none());
        assert!(find_nearest(f64::NAN, &d, &x).is_none());
    }

    #[test]
    fn test_custom_threshold() {
        let d = data(&[0, 10]);
        let x = scale(&d, 1000.0);
        assert!(find_nearest_within(30.0, &d, &x, 20.0).is_none());
        assert_eq!(find_nearest_within(30.0, &d, &x, 40.0).unwrap().index, 0);
    }
}
