//! Hover state and overlay
//!
//! Hover decorations sit on top of a [`ChartFrame`] and are derived from it
//! without touching it: a dashed guide line, the enlarged marker and the
//! detail panel.

use crate::format::{format_date, format_time, ValueFormat};
use crate::layout::{ChartFrame, Point, MARKER_RADIUS_ACTIVE};
use crate::types::AggregatedBucket;
use chrono::FixedOffset;
use serde::Serialize;

/// Narrowest detail panel, in pixels
pub const PANEL_MIN_WIDTH: f64 = 150.0;
/// Distance from the top of the chart to the panel
pub const PANEL_TOP: f64 = 10.0;
/// Approximate glyph advance used to size the panel
const PANEL_CHAR_WIDTH: f64 = 7.0;
const PANEL_PADDING: f64 = 12.0;
/// Height of one text line in the panel
pub const PANEL_LINE_HEIGHT: f64 = 18.0;

/// Stroke width of the hovered marker
pub const ACTIVE_MARKER_STROKE: f64 = 2.0;

/// Pointer interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoverState {
    #[default]
    Idle,
    Hovering { index: usize },
}

impl HoverState {
    pub fn index(&self) -> Option<usize> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering { index } => Some(*index),
        }
    }
}

/// Tooltip box, positioned in chart (outer) coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPanel {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub lines: Vec<String>,
}

/// Decorations drawn for the hovered point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverOverlay {
    pub index: usize,
    /// Plot-local x of the dashed guide line
    pub guide_x: f64,
    /// Plot-local center of the enlarged marker
    pub marker: Point,
    pub marker_radius: f64,
    pub marker_stroke: f64,
    pub panel: DetailPanel,
}

/// Labels shared by every overlay of one chart
#[derive(Debug, Clone, Copy)]
pub struct PanelText<'a> {
    pub title: &'a str,
    pub value_label: &'a str,
    pub format: &'a ValueFormat,
    pub zone: &'a FixedOffset,
}

/// Build the overlay for `index` at plot-local pointer x.
///
/// `None` when the index has no marker in `frame`.
pub fn build_overlay(
    frame: &ChartFrame,
    bucket: &AggregatedBucket,
    index: usize,
    pointer_x: f64,
    text: PanelText<'_>,
) -> Option<HoverOverlay> {
    let marker = frame.marker(index)?;
    let lines = detail_lines(bucket, &text);
    let title = format!("{} Details", text.title);

    let longest = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);
    let width = (longest as f64 * PANEL_CHAR_WIDTH + 2.0 * PANEL_PADDING).max(PANEL_MIN_WIDTH);
    let height = (lines.len() + 1) as f64 * PANEL_LINE_HEIGHT + 2.0 * PANEL_PADDING;

    let margins = frame.layout.margins;
    let plot_width = frame.layout.plot_width();
    let left = pointer_x + margins.left - width / 2.0;
    let left = left.min(plot_width + margins.left - width).max(margins.left);

    Some(HoverOverlay {
        index,
        guide_x: marker.center.x,
        marker: marker.center,
        marker_radius: MARKER_RADIUS_ACTIVE,
        marker_stroke: ACTIVE_MARKER_STROKE,
        panel: DetailPanel {
            left,
            top: PANEL_TOP,
            width,
            height,
            title,
            lines,
        },
    })
}

/// Text lines of the detail panel, below the title
pub fn detail_lines(bucket: &AggregatedBucket, text: &PanelText<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("Time: {}", format_time(&bucket.timestamp, text.zone)),
        format!("Date: {}", format_date(&bucket.timestamp, text.zone)),
        format!("{}: {}", text.value_label, text.format.format(bucket.value)),
    ];
    if bucket.is_aggregated() {
        lines.push(format!(
            "Range: {} - {}",
            text.format.format(bucket.low()),
            text.format.format(bucket.high())
        ));
        if let Some(count) = bucket.count {
            lines.push(format!("Samples: {count}"));
        }
    }
    lines
}
