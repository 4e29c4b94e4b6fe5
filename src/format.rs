//! Value and time formatting for axes and the hover panel

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Formatter applied to plotted values in the hover panel
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "unit", rename_all = "snake_case")]
pub enum ValueFormat {
    /// Number as-is
    #[default]
    Plain,
    /// Number followed by a unit, e.g. `62 bpm`
    Unit(String),
    /// Number followed by `%`
    Percent,
    /// Minutes rendered as `7h 30m`
    Duration,
    /// Caller-supplied formatter
    #[serde(skip)]
    Custom(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl ValueFormat {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        ValueFormat::Custom(Arc::new(f))
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Plain => format_number(value),
            ValueFormat::Unit(unit) => format!("{} {}", format_number(value), unit),
            ValueFormat::Percent => format!("{}%", format_number(value)),
            ValueFormat::Duration => format_duration(value),
            ValueFormat::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFormat::Plain => write!(f, "Plain"),
            ValueFormat::Unit(unit) => f.debug_tuple("Unit").field(unit).finish(),
            ValueFormat::Percent => write!(f, "Percent"),
            ValueFormat::Duration => write!(f, "Duration"),
            ValueFormat::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Whole numbers without decimals, others with at most two
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Minutes as `Xh Ym`
pub fn format_duration(minutes: f64) -> String {
    let total = minutes.round().max(0.0) as i64;
    format!("{}h {}m", total / 60, total % 60)
}

/// Clock time in the local zone, e.g. `2:05:00 PM`
pub fn format_time(timestamp: &DateTime<Utc>, zone: &FixedOffset) -> String {
    timestamp
        .with_timezone(zone)
        .format("%-I:%M:%S %p")
        .to_string()
}

/// Calendar date in the local zone, e.g. `1/15/2024`
pub fn format_date(timestamp: &DateTime<Utc>, zone: &FixedOffset) -> String {
    timestamp
        .with_timezone(zone)
        .format("%-m/%-d/%Y")
        .to_string()
}

/// Axis label for a time tick; `multi_day` switches from clock time to dates
pub fn format_time_tick(timestamp: &DateTime<Utc>, zone: &FixedOffset, multi_day: bool) -> String {
    let local = timestamp.with_timezone(zone);
    if multi_day {
        local.format("%b %d").to_string()
    } else {
        local.format("%H:%M").to_string()
    }
}
