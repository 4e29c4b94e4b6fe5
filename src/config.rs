//! Dashboard configuration
//!
//! Layout defaults, the granularity selector and the chart presets shown on
//! the dashboard. Configurations round-trip through JSON.

use crate::chart::{ChartOptions, TimeSeriesChart};
use crate::error::ChartError;
use crate::format::ValueFormat;
use crate::granularity::{default_granularity_options, find_option, validate_options, GranularityOption};
use crate::layout::PlotLayout;
use crate::types::{
    parse_utc_offset, SeriesKind, METRIC_BPM, METRIC_DEEP_SLEEP, METRIC_DURATION,
    METRIC_REM_SLEEP, METRIC_SCORE,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One chart on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPreset {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    pub kind: SeriesKind,
    pub value_key: String,
    pub value_label: String,
    #[serde(default)]
    pub format: ValueFormat,
    /// Initial granularity, overriding the dashboard default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
}

/// Dashboard-wide chart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub layout: PlotLayout,
    /// Local zone for bucketing and labels, e.g. `+02:00` or `UTC`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_granularity_options")]
    pub granularity_options: Vec<GranularityOption>,
    #[serde(default = "default_granularity_key")]
    pub default_granularity: String,
    #[serde(default)]
    pub presets: BTreeMap<String, ChartPreset>,
}

fn default_utc_offset() -> String {
    "UTC".to_string()
}

fn default_granularity_key() -> String {
    "fine".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            layout: PlotLayout::default(),
            utc_offset: default_utc_offset(),
            granularity_options: default_granularity_options(),
            default_granularity: default_granularity_key(),
            presets: builtin_presets(),
        }
    }
}

impl ChartConfig {
    /// Load a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check granularity options, the default key, every preset's initial
    /// granularity and the UTC offset
    pub fn validate(&self) -> Result<(), ChartError> {
        validate_options(&self.granularity_options)?;
        find_option(&self.granularity_options, &self.default_granularity).map_err(|_| {
            ChartError::ConfigError(format!(
                "default granularity `{}` is not an option",
                self.default_granularity
            ))
        })?;
        for (name, preset) in &self.presets {
            if let Some(key) = &preset.granularity {
                find_option(&self.granularity_options, key).map_err(|_| {
                    ChartError::ConfigError(format!(
                        "preset `{name}` uses unknown granularity `{key}`"
                    ))
                })?;
            }
        }
        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> Result<FixedOffset, ChartError> {
        parse_utc_offset(&self.utc_offset)
    }

    pub fn preset(&self, name: &str) -> Result<&ChartPreset, ChartError> {
        self.presets
            .get(name)
            .ok_or_else(|| ChartError::ConfigError(format!("unknown preset: {name}")))
    }

    /// Chart options for a preset
    pub fn options(&self, name: &str) -> Result<ChartOptions, ChartError> {
        let preset = self.preset(name)?;
        let granularity = preset
            .granularity
            .clone()
            .unwrap_or_else(|| self.default_granularity.clone());

        let mut options = ChartOptions::new(preset.title.clone())
            .value(preset.value_key.clone(), preset.value_label.clone())
            .format_value(preset.format.clone())
            .granularity_options(self.granularity_options.clone())
            .granularity(granularity)
            .layout(self.layout)
            .zone(self.zone()?);
        options.subtitle = preset.subtitle.clone();
        options.y_axis_label = preset.y_axis_label.clone();
        Ok(options)
    }

    /// Build the chart for a preset, in the loading state
    pub fn chart(&self, name: &str) -> Result<TimeSeriesChart, ChartError> {
        TimeSeriesChart::new(self.options(name)?)
    }

    /// Names of presets plotting `kind`
    pub fn presets_for(&self, kind: SeriesKind) -> Vec<&str> {
        self.presets
            .iter()
            .filter(|(_, p)| p.kind == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

fn sleep_preset(title: &str, value_key: &str, value_label: &str, format: ValueFormat) -> ChartPreset {
    ChartPreset {
        title: title.to_string(),
        subtitle: Some("Last 7 days".to_string()),
        y_axis_label: Some(value_label.to_string()),
        kind: SeriesKind::Sleep,
        value_key: value_key.to_string(),
        value_label: value_label.to_string(),
        format,
        granularity: Some("daily".to_string()),
    }
}

/// Charts shown on the dashboard
pub fn builtin_presets() -> BTreeMap<String, ChartPreset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "heart_rate".to_string(),
        ChartPreset {
            title: "Heart Rate".to_string(),
            subtitle: Some("Last 24 hours".to_string()),
            y_axis_label: Some("Heart Rate (BPM)".to_string()),
            kind: SeriesKind::Heartrate,
            value_key: METRIC_BPM.to_string(),
            value_label: "Heart Rate".to_string(),
            format: ValueFormat::Unit("BPM".to_string()),
            granularity: None,
        },
    );
    presets.insert(
        "sleep_score".to_string(),
        sleep_preset("Sleep Score", METRIC_SCORE, "Score", ValueFormat::Percent),
    );
    presets.insert(
        "sleep_duration".to_string(),
        sleep_preset("Sleep Duration", METRIC_DURATION, "Duration", ValueFormat::Duration),
    );
    presets.insert(
        "deep_sleep".to_string(),
        sleep_preset("Deep Sleep", METRIC_DEEP_SLEEP, "Duration", ValueFormat::Duration),
    );
    presets.insert(
        "rem_sleep".to_string(),
        sleep_preset("REM Sleep", METRIC_REM_SLEEP, "Duration", ValueFormat::Duration),
    );
    presets
}
