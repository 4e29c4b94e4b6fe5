//! Error types for VitalView

use thiserror::Error;

/// Errors that can occur while loading, aggregating or charting a series
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to fetch series: {0}")]
    FetchFailure(String),

    #[error("No authentication token available")]
    MissingCredential,

    #[error("Invalid response format from API: {0}")]
    InvalidResponse(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid bucket width: {0} minutes")]
    InvalidGranularity(u32),

    #[error("Unknown granularity: {0}")]
    UnknownGranularity(String),

    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl ChartError {
    /// Whether this error belongs to the fetch stage.
    ///
    /// Fetch-level errors replace the chart with an error state; a missing
    /// credential is reported the same way since the user cannot proceed.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            ChartError::FetchFailure(_)
                | ChartError::MissingCredential
                | ChartError::InvalidResponse(_)
                | ChartError::JsonError(_)
        )
    }
}
