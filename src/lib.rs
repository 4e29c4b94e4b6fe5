//! VitalView - Health time-series charting core
//!
//! VitalView turns heart-rate and sleep records fetched from a wearable relay
//! into interactive line charts through a deterministic pipeline:
//! record adaptation → normalization → granularity aggregation → scales and
//! layout → rendering, with pointer proximity resolution for the hover panel.
//!
//! ## Modules
//!
//! - **Data**: [`adapters`], [`normalizer`], [`granularity`], [`aggregator`]
//! - **Geometry**: [`scale`], [`layout`], [`proximity`], [`hover`]
//! - **Charts**: [`chart`], [`render`], [`format`], [`config`]
//! - **Loading**: [`loader`], [`pipeline`]

pub mod adapters;
pub mod aggregator;
pub mod chart;
pub mod config;
pub mod error;
pub mod format;
pub mod granularity;
pub mod hover;
pub mod layout;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod proximity;
pub mod render;
pub mod scale;
pub mod types;

pub use aggregator::aggregate;
pub use chart::{ChartOptions, RenderState, TimeSeriesChart};
pub use config::{ChartConfig, ChartPreset};
pub use error::ChartError;
pub use format::ValueFormat;
pub use granularity::{BucketWidth, GranularityOption};
pub use loader::{Credentials, JsonFileSource, RequestTicket, SeriesLoader, SeriesSource};
pub use normalizer::{select_metric, Normalizer};
pub use pipeline::{aggregate_series, chart_from_json, render_svg};
pub use proximity::{find_nearest, HOVER_THRESHOLD_PX};
pub use render::{RenderBackend, SvgBackend};
pub use scale::compute_scales;
pub use types::{AggregatedBucket, CanonicalSample, SeriesKind, UpstreamRecord};

/// VitalView version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
