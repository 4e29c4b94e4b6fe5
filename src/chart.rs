//! Time-series chart component
//!
//! One parameterized chart serves every metric on the dashboard. The chart
//! owns its samples, the selected granularity, the current frame and the
//! hover state:
//!
//! - data, granularity or size changes rebuild the frame (and bump
//!   [`TimeSeriesChart::frame_revision`])
//! - pointer moves only recompute the hover overlay on top of it

use crate::aggregator::aggregate;
use crate::error::ChartError;
use crate::format::ValueFormat;
use crate::granularity::{
    default_granularity_options, find_option, validate_options, BucketWidth, GranularityOption,
};
use crate::hover::{build_overlay, HoverOverlay, HoverState, PanelText};
use crate::layout::{build_frame, ChartFrame, PlotLayout};
use crate::normalizer::{select_metric, Normalizer};
use crate::proximity::find_nearest;
use crate::render::{draw_view, ChartView, Header, RenderBackend, SvgBackend};
use crate::types::{
    utc_zone, AggregatedBucket, CanonicalSample, NormalizeReport, SeriesKind, UpstreamRecord,
    PRIMARY_VALUE_KEY,
};
use chrono::FixedOffset;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

/// Called with the new granularity key after a change
pub type GranularityCallback = Box<dyn FnMut(&str)>;

/// What the chart currently shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RenderState {
    Loading,
    Error(String),
    /// Loaded, but nothing to plot
    Empty,
    Ready,
}

/// Chart configuration
pub struct ChartOptions {
    pub title: String,
    pub subtitle: Option<String>,
    pub y_axis_label: Option<String>,
    /// Metric plotted as the line, `"value"` for the series' primary metric
    pub value_key: String,
    /// Label of the value line in the detail panel
    pub value_label: String,
    /// Initially selected granularity key, the first option when unset
    pub granularity: Option<String>,
    pub granularity_options: Vec<GranularityOption>,
    pub format_value: ValueFormat,
    pub layout: PlotLayout,
    /// Zone used for bucketing and labels
    pub zone: FixedOffset,
    pub on_granularity_change: Option<GranularityCallback>,
}

impl ChartOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            y_axis_label: None,
            value_key: PRIMARY_VALUE_KEY.to_string(),
            value_label: "Value".to_string(),
            granularity: None,
            granularity_options: default_granularity_options(),
            format_value: ValueFormat::default(),
            layout: PlotLayout::default(),
            zone: utc_zone(),
            on_granularity_change: None,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn y_axis_label(mut self, label: impl Into<String>) -> Self {
        self.y_axis_label = Some(label.into());
        self
    }

    pub fn value(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.value_key = key.into();
        self.value_label = label.into();
        self
    }

    pub fn granularity(mut self, key: impl Into<String>) -> Self {
        self.granularity = Some(key.into());
        self
    }

    pub fn granularity_options(mut self, options: Vec<GranularityOption>) -> Self {
        self.granularity_options = options;
        self
    }

    pub fn format_value(mut self, format: ValueFormat) -> Self {
        self.format_value = format;
        self
    }

    pub fn layout(mut self, layout: PlotLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn zone(mut self, zone: FixedOffset) -> Self {
        self.zone = zone;
        self
    }

    pub fn on_granularity_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str) + 'static,
    {
        self.on_granularity_change = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for ChartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartOptions")
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("y_axis_label", &self.y_axis_label)
            .field("value_key", &self.value_key)
            .field("value_label", &self.value_label)
            .field("granularity", &self.granularity)
            .field("granularity_options", &self.granularity_options)
            .field("format_value", &self.format_value)
            .field("layout", &self.layout)
            .field("zone", &self.zone)
            .field(
                "on_granularity_change",
                &self.on_granularity_change.as_ref().map(|_| ".."),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Loading,
    Failed(String),
    Loaded,
}

/// Interactive time-series line chart
#[derive(Debug)]
pub struct TimeSeriesChart {
    options: ChartOptions,
    selected: GranularityOption,
    width: BucketWidth,
    status: Status,
    samples: Vec<CanonicalSample>,
    data: Vec<AggregatedBucket>,
    frame: Option<ChartFrame>,
    frame_revision: u64,
    hover: HoverState,
    overlay: Option<HoverOverlay>,
}

impl TimeSeriesChart {
    /// Create a chart in the loading state.
    ///
    /// Fails when the granularity options are invalid or the initial key is
    /// not among them.
    pub fn new(options: ChartOptions) -> Result<Self, ChartError> {
        validate_options(&options.granularity_options)?;
        let selected = match &options.granularity {
            Some(key) => find_option(&options.granularity_options, key)?.clone(),
            None => options.granularity_options[0].clone(),
        };
        let width = selected.width()?;

        Ok(Self {
            options,
            selected,
            width,
            status: Status::Loading,
            samples: Vec::new(),
            data: Vec::new(),
            frame: None,
            frame_revision: 0,
            hover: HoverState::Idle,
            overlay: None,
        })
    }

    pub fn set_loading(&mut self) {
        self.status = Status::Loading;
        self.clear_hover();
    }

    /// Replace the chart with an error message
    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(chart = %self.options.title, error = %message, "chart error");
        self.status = Status::Failed(message);
        self.clear_hover();
    }

    /// Normalize raw relay records and plot them
    pub fn set_records(&mut self, kind: SeriesKind, records: &[UpstreamRecord]) -> NormalizeReport {
        let normalized =
            Normalizer::normalize_metric(kind, records, &self.options.zone, &self.options.value_key);
        self.samples = normalized.samples;
        self.loaded();
        normalized.report
    }

    /// Plot already normalized samples, projected onto the chart's value key
    /// and sorted by timestamp
    pub fn set_samples(&mut self, samples: &[CanonicalSample]) {
        let mut projected = select_metric(samples, &self.options.value_key);
        projected.sort_by_key(|s| s.timestamp);
        self.samples = projected;
        self.loaded();
    }

    /// Switch granularity by key and notify the change callback
    pub fn select_granularity(&mut self, key: &str) -> Result<(), ChartError> {
        let option = find_option(&self.options.granularity_options, key)?.clone();
        self.width = option.width()?;
        self.selected = option;
        debug!(chart = %self.options.title, granularity = key, "granularity changed");

        self.reaggregate();
        if let Some(callback) = self.options.on_granularity_change.as_mut() {
            callback(key);
        }
        Ok(())
    }

    /// Change the outer chart width
    pub fn resize(&mut self, width: f64) {
        if self.options.layout.width == width {
            return;
        }
        self.options.layout.width = width;
        self.rebuild_frame();
    }

    /// Resolve the hover state for a pointer in plot-local pixels
    pub fn pointer_move(&mut self, x: f64, y: f64) -> HoverState {
        let overlay = match &self.frame {
            Some(frame) if self.status == Status::Loaded && frame.layout.contains(x, y) => {
                find_nearest(x, &self.data, &frame.geometry.x).and_then(|nearest| {
                    let text = PanelText {
                        title: &self.options.title,
                        value_label: &self.options.value_label,
                        format: &self.options.format_value,
                        zone: &self.options.zone,
                    };
                    build_overlay(frame, nearest.bucket, nearest.index, x, text)
                })
            }
            _ => None,
        };

        self.hover = match &overlay {
            Some(overlay) => HoverState::Hovering {
                index: overlay.index,
            },
            None => HoverState::Idle,
        };
        self.overlay = overlay;
        self.hover
    }

    pub fn pointer_leave(&mut self) {
        self.clear_hover();
    }

    pub fn state(&self) -> RenderState {
        match &self.status {
            Status::Loading => RenderState::Loading,
            Status::Failed(message) => RenderState::Error(message.clone()),
            Status::Loaded if self.data.is_empty() => RenderState::Empty,
            Status::Loaded => RenderState::Ready,
        }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn granularity(&self) -> &GranularityOption {
        &self.selected
    }

    pub fn samples(&self) -> &[CanonicalSample] {
        &self.samples
    }

    /// Aggregated data at the selected granularity
    pub fn data(&self) -> &[AggregatedBucket] {
        &self.data
    }

    pub fn frame(&self) -> Option<&ChartFrame> {
        self.frame.as_ref()
    }

    /// Incremented on every frame rebuild
    pub fn frame_revision(&self) -> u64 {
        self.frame_revision
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn overlay(&self) -> Option<&HoverOverlay> {
        self.overlay.as_ref()
    }

    /// Declarative view of the current state
    pub fn view(&self) -> ChartView<'_> {
        let header = Header {
            title: &self.options.title,
            subtitle: self.options.subtitle.as_deref(),
            granularity: Some(self.selected.label.as_str()),
        };
        match (&self.status, &self.frame) {
            (Status::Loading, _) => ChartView::Loading {
                title: &self.options.title,
            },
            (Status::Failed(message), _) => ChartView::Error {
                message: message.as_str(),
            },
            (Status::Loaded, Some(frame)) => ChartView::Ready {
                header,
                frame,
                overlay: self.overlay.as_ref(),
            },
            (Status::Loaded, None) => ChartView::Empty { header },
        }
    }

    pub fn render<B: RenderBackend>(&self, mut backend: B) -> B::Output {
        draw_view(&mut backend, &self.view(), &self.options.layout);
        backend.finish()
    }

    pub fn render_svg(&self) -> Result<String, ChartError> {
        self.render(SvgBackend::new())
    }

    fn loaded(&mut self) {
        self.status = Status::Loaded;
        self.reaggregate();
    }

    fn reaggregate(&mut self) {
        self.data = aggregate(&self.samples, self.width, &self.options.zone);
        self.rebuild_frame();
    }

    fn rebuild_frame(&mut self) {
        self.frame = build_frame(
            &self.data,
            self.options.layout,
            &self.options.zone,
            self.options.y_axis_label.as_deref(),
        );
        self.frame_revision += 1;
        self.clear_hover();
        trace!(
            chart = %self.options.title,
            revision = self.frame_revision,
            points = self.data.len(),
            granularity = %self.selected.key,
            "rebuilt frame"
        );
    }

    fn clear_hover(&mut self) {
        self.hover = HoverState::Idle;
        self.overlay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{METRIC_BPM, METRIC_DEEP_SLEEP};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    fn heart_rate() -> TimeSeriesChart {
        TimeSeriesChart::new(
            ChartOptions::new("Heart Rate")
                .subtitle("Last 24 hours")
                .y_axis_label("Heart Rate (BPM)")
                .value(METRIC_BPM, "BPM"),
        )
        .unwrap()
    }

    fn samples() -> Vec<CanonicalSample> {
        [(0, 60.0), (5, 64.0), (10, 58.0), (14, 62.0)]
            .iter()
            .map(|(m, v)| CanonicalSample::new(at(*m), *v).with_metric(METRIC_BPM, Some(*v)))
            .collect()
    }

    #[test]
    fn test_set_samples_sorts_unordered_input() {
        let mut chart = heart_rate();
        let mut shuffled = samples();
        shuffled.swap(0, 3);
        shuffled.swap(1, 2);
        chart.set_samples(&shuffled);

        let times: Vec<_> = chart.data().iter().map(|b| b.timestamp).collect();
        assert_eq!(times, vec![at(0), at(5), at(10), at(14)]);
        assert_eq!(chart.data()[0].value, 60.0);

        let frame = chart.frame().unwrap();
        let xs: Vec<f64> = frame.markers.iter().map(|m| m.center.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lifecycle_states() {
        let mut chart = heart_rate();
        assert_eq!(chart.state(), RenderState::Loading);
        assert!(chart.render_svg().unwrap().contains("Loading heart rate data..."));

        chart.set_samples(&[]);
        assert_eq!(chart.state(), RenderState::Empty);
        assert!(chart.frame().is_none());

        chart.set_samples(&samples());
        assert_eq!(chart.state(), RenderState::Ready);
        assert_eq!(chart.data().len(), 4);

        chart.set_error("Invalid response format from API");
        assert_eq!(
            chart.state(),
            RenderState::Error("Invalid response format from API".to_string())
        );
    }

    #[test]
    fn test_unknown_initial_granularity() {
        let result = TimeSeriesChart::new(ChartOptions::new("Heart Rate").granularity("weekly"));
        assert!(matches!(result, Err(ChartError::UnknownGranularity(k)) if k == "weekly"));
    }

    #[test]
    fn test_select_granularity_reaggregates_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut chart = TimeSeriesChart::new(
            ChartOptions::new("Heart Rate")
                .value(METRIC_BPM, "BPM")
                .on_granularity_change(move |key| sink.borrow_mut().push(key.to_string())),
        )
        .unwrap();
        chart.set_samples(&samples());
        let revision = chart.frame_revision();

        chart.select_granularity("5min").unwrap();
        assert_eq!(chart.data().len(), 3);
        assert_eq!(chart.data()[2].count, Some(2));
        assert_eq!(chart.granularity().key, "5min");
        assert!(chart.frame_revision() > revision);
        assert_eq!(*seen.borrow(), vec!["5min".to_string()]);

        let err = chart.select_granularity("weekly").unwrap_err();
        assert!(matches!(err, ChartError::UnknownGranularity(_)));
        assert_eq!(chart.granularity().key, "5min");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_hover_does_not_rebuild_frame() {
        let mut chart = heart_rate();
        chart.set_samples(&samples());
        let revision = chart.frame_revision();
        let frame = chart.frame().cloned().unwrap();

        let x = frame.markers[1].center.x;
        assert_eq!(
            chart.pointer_move(x + 3.0, 100.0),
            HoverState::Hovering { index: 1 }
        );
        let overlay = chart.overlay().unwrap();
        assert_eq!(overlay.panel.title, "Heart Rate Details");
        assert!(overlay.panel.lines.contains(&"BPM: 64".to_string()));

        chart.pointer_move(frame.markers[2].center.x, 50.0);
        assert_eq!(chart.hover(), HoverState::Hovering { index: 2 });

        chart.pointer_leave();
        assert_eq!(chart.hover(), HoverState::Idle);
        assert!(chart.overlay().is_none());

        assert_eq!(chart.frame_revision(), revision);
        assert_eq!(chart.frame(), Some(&frame));
    }

    #[test]
    fn test_pointer_outside_plot_is_idle() {
        let mut chart = heart_rate();
        chart.set_samples(&samples());

        assert_eq!(chart.pointer_move(-10.0, 100.0), HoverState::Idle);
        assert_eq!(chart.pointer_move(100.0, 400.0), HoverState::Idle);

        // Far from both points of a two-sample chart
        chart.set_samples(&samples()[..2].to_vec());
        assert_eq!(chart.pointer_move(365.0, 100.0), HoverState::Idle);
    }

    #[test]
    fn test_resize_rebuilds_frame() {
        let mut chart = heart_rate();
        chart.set_samples(&samples());
        let revision = chart.frame_revision();

        chart.resize(400.0);
        assert_eq!(chart.frame_revision(), revision + 1);
        assert_eq!(chart.frame().unwrap().markers[3].center.x, 330.0);

        chart.resize(400.0);
        assert_eq!(chart.frame_revision(), revision + 1);
    }

    #[test]
    fn test_set_records_uses_value_key() {
        let mut chart = TimeSeriesChart::new(
            ChartOptions::new("Deep Sleep")
                .value(METRIC_DEEP_SLEEP, "Deep Sleep")
                .format_value(ValueFormat::Duration)
                .granularity("daily"),
        )
        .unwrap();

        let records = vec![
            json!({"day": "2024-01-14", "score": 80, "deep_sleep_duration": 5400}),
            json!({"day": "2024-01-15", "score": 82}),
            json!({"day": "2024-01-16", "score": 85, "deep_sleep_duration": 3600}),
        ];
        let report = chart.set_records(SeriesKind::Sleep, &records);

        assert_eq!(report.missing_value, 1);
        let values: Vec<f64> = chart.data().iter().map(|b| b.value).collect();
        assert_eq!(values, vec![90.0, 60.0]);
    }

    #[test]
    fn test_svg_output() {
        let mut chart = heart_rate();
        chart.set_samples(&samples());
        let x = chart.frame().unwrap().markers[0].center.x;
        chart.pointer_move(x, 10.0);

        let svg = chart.render_svg().unwrap();
        assert_eq!(svg.matches("<polyline").count(), 1);
        // fill and outline for four markers plus the hover marker
        assert_eq!(svg.matches("<circle").count(), 10);
        assert!(svg.contains("Heart Rate Details"));
        assert!(svg.contains("Last 24 hours"));
    }
}
