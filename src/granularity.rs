//! Granularity options
//!
//! A granularity is the caller-selected bucket width. Widths are whole
//! minutes; 1440 is the daily sentinel, which buckets by calendar date
//! rather than by minute arithmetic.

use crate::error::ChartError;
use serde::{Deserialize, Serialize};

/// Bucket width of the finest granularity (raw samples)
pub const FINEST_BUCKET_MINUTES: u32 = 1;

/// Sentinel bucket width meaning "one bucket per calendar day"
pub const DAILY_BUCKET_MINUTES: u32 = 1440;

/// Typed bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketWidth {
    /// Fixed number of minutes within the local day, `1..1440`
    Minutes(u32),
    /// Calendar day in the local zone
    Daily,
}

impl BucketWidth {
    /// Finest granularity; aggregation is the identity
    pub const FINEST: BucketWidth = BucketWidth::Minutes(FINEST_BUCKET_MINUTES);

    /// Validate a width in minutes
    pub fn from_minutes(minutes: u32) -> Result<Self, ChartError> {
        match minutes {
            0 => Err(ChartError::InvalidGranularity(minutes)),
            DAILY_BUCKET_MINUTES => Ok(BucketWidth::Daily),
            m if m > DAILY_BUCKET_MINUTES => Err(ChartError::InvalidGranularity(m)),
            m => Ok(BucketWidth::Minutes(m)),
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            BucketWidth::Minutes(m) => *m,
            BucketWidth::Daily => DAILY_BUCKET_MINUTES,
        }
    }

    pub fn is_finest(&self) -> bool {
        self.minutes() <= FINEST_BUCKET_MINUTES
    }
}

/// One entry of the granularity selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranularityOption {
    /// Stable identifier reported to `on_granularity_change`
    pub key: String,
    /// Positive width in minutes; 1440 means daily
    pub bucket_width_minutes: u32,
    /// Display string for the selector
    pub label: String,
}

impl GranularityOption {
    pub fn new(key: &str, bucket_width_minutes: u32, label: &str) -> Self {
        Self {
            key: key.to_string(),
            bucket_width_minutes,
            label: label.to_string(),
        }
    }

    pub fn width(&self) -> Result<BucketWidth, ChartError> {
        BucketWidth::from_minutes(self.bucket_width_minutes)
    }
}

/// Options offered by the dashboard selector
pub fn default_granularity_options() -> Vec<GranularityOption> {
    vec![
        GranularityOption::new("fine", FINEST_BUCKET_MINUTES, "Every sample"),
        GranularityOption::new("5min", 5, "5 minutes"),
        GranularityOption::new("15min", 15, "15 minutes"),
        GranularityOption::new("hourly", 60, "Hourly"),
        GranularityOption::new("daily", DAILY_BUCKET_MINUTES, "Daily"),
    ]
}

/// Find an option by key
pub fn find_option<'a>(
    options: &'a [GranularityOption],
    key: &str,
) -> Result<&'a GranularityOption, ChartError> {
    options
        .iter()
        .find(|o| o.key == key)
        .ok_or_else(|| ChartError::UnknownGranularity(key.to_string()))
}

/// Check a set of options: unique keys and valid widths
pub fn validate_options(options: &[GranularityOption]) -> Result<(), ChartError> {
    if options.is_empty() {
        return Err(ChartError::ConfigError(
            "at least one granularity option is required".to_string(),
        ));
    }
    for (i, option) in options.iter().enumerate() {
        option.width()?;
        if options[..i].iter().any(|o| o.key == option.key) {
            return Err(ChartError::ConfigError(format!(
                "duplicate granularity key: {}",
                option.key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minutes() {
        assert_eq!(BucketWidth::from_minutes(1).unwrap(), BucketWidth::FINEST);
        assert!(BucketWidth::from_minutes(1).unwrap().is_finest());
        assert_eq!(BucketWidth::from_minutes(5).unwrap(), BucketWidth::Minutes(5));
        assert_eq!(BucketWidth::from_minutes(1440).unwrap(), BucketWidth::Daily);
        assert!(matches!(
            BucketWidth::from_minutes(0),
            Err(ChartError::InvalidGranularity(0))
        ));
        assert!(BucketWidth::from_minutes(2000).is_err());
    }

    #[test]
    fn test_default_options_are_valid() {
        let options = default_granularity_options();
        validate_options(&options).unwrap();
        assert_eq!(find_option(&options, "hourly").unwrap().bucket_width_minutes, 60);
        assert!(matches!(
            find_option(&options, "weekly"),
            Err(ChartError::UnknownGranularity(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let options = vec![
            GranularityOption::new("fine", 1, "a"),
            GranularityOption::new("fine", 5, "b"),
        ];
        assert!(matches!(
            validate_options(&options),
            Err(ChartError::ConfigError(_))
        ));
    }
}
