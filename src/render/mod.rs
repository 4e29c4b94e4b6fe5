//! Rendering
//!
//! Backends implement [`RenderBackend`] and only draw primitives. Everything
//! they receive is already laid out: [`draw_view`] walks a [`ChartView`] and
//! translates the frame and its overlay into absolute chart coordinates.

pub mod style;
pub mod svg;

pub use svg::SvgBackend;

use crate::hover::{HoverOverlay, PANEL_LINE_HEIGHT};
use crate::layout::{ChartFrame, PathCommand, PlotLayout, Point, MARKER_RADIUS};
use plotters::style::RGBColor;
use style::*;

/// Height of the title band above the plot
pub const HEADER_HEIGHT: f64 = 50.0;

const TICK_LENGTH: f64 = 6.0;

/// Drawing surface for charts
pub trait RenderBackend {
    type Output;

    /// Start a drawing of the given outer size
    fn begin(&mut self, width: f64, height: f64);
    fn line(&mut self, from: Point, to: Point, stroke: Stroke);
    fn path(&mut self, commands: &[PathCommand], stroke: Stroke);
    fn circle(&mut self, center: Point, radius: f64, fill: RGBColor, stroke: Stroke);
    fn rect(&mut self, origin: Point, width: f64, height: f64, fill: RGBColor, stroke: Option<Stroke>);
    fn text(&mut self, at: Point, content: &str, style: TextStyle);
    fn finish(self) -> Self::Output;
}

/// Title block drawn above a chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header<'a> {
    pub title: &'a str,
    pub subtitle: Option<&'a str>,
    /// Label of the selected granularity, shown at the right
    pub granularity: Option<&'a str>,
}

/// What a chart shows in one render pass
#[derive(Debug, Clone, Copy)]
pub enum ChartView<'a> {
    Loading {
        title: &'a str,
    },
    Error {
        message: &'a str,
    },
    Empty {
        header: Header<'a>,
    },
    Ready {
        header: Header<'a>,
        frame: &'a ChartFrame,
        overlay: Option<&'a HoverOverlay>,
    },
}

pub fn loading_message(title: &str) -> String {
    format!("Loading {} data...", title.to_lowercase())
}

pub fn empty_message(title: &str) -> String {
    format!(
        "No {} data available for the selected time period.",
        title.to_lowercase()
    )
}

/// Draw `view` onto `backend`
pub fn draw_view<B: RenderBackend>(backend: &mut B, view: &ChartView<'_>, layout: &PlotLayout) {
    let total_height = HEADER_HEIGHT + layout.height;
    backend.begin(layout.width, total_height);

    match view {
        ChartView::Loading { title } => {
            let style = TextStyle::new(MUTED_COLOR, BODY_SIZE).anchored(TextAnchor::Middle);
            backend.text(
                Point::new(layout.width / 2.0, total_height / 2.0),
                &loading_message(title),
                style,
            );
        }
        ChartView::Error { message } => {
            let inset = 10.0;
            backend.rect(
                Point::new(inset, inset),
                (layout.width - 2.0 * inset).max(0.0),
                (total_height - 2.0 * inset).max(0.0),
                ERROR_BACKGROUND,
                None,
            );
            let style = TextStyle::new(ERROR_COLOR, BODY_SIZE).anchored(TextAnchor::Middle);
            backend.text(
                Point::new(layout.width / 2.0, total_height / 2.0),
                message,
                style,
            );
        }
        ChartView::Empty { header } => {
            draw_header(backend, header, layout);
            let style = TextStyle::new(MUTED_COLOR, BODY_SIZE).anchored(TextAnchor::Middle);
            backend.text(
                Point::new(layout.width / 2.0, HEADER_HEIGHT + layout.height / 2.0),
                &empty_message(header.title),
                style,
            );
        }
        ChartView::Ready {
            header,
            frame,
            overlay,
        } => {
            draw_header(backend, header, layout);
            let origin = Point::new(
                frame.layout.margins.left,
                HEADER_HEIGHT + frame.layout.margins.top,
            );
            draw_frame(backend, frame, origin);
            if let Some(overlay) = overlay {
                draw_overlay(backend, overlay, frame, origin);
            }
        }
    }
}

fn draw_header<B: RenderBackend>(backend: &mut B, header: &Header<'_>, layout: &PlotLayout) {
    let x = layout.margins.left;
    backend.text(
        Point::new(x, 22.0),
        header.title,
        TextStyle::new(HEADING_COLOR, TITLE_SIZE).bold(),
    );
    if let Some(subtitle) = header.subtitle {
        backend.text(
            Point::new(x, 40.0),
            subtitle,
            TextStyle::new(MUTED_COLOR, BODY_SIZE),
        );
    }
    if let Some(granularity) = header.granularity {
        backend.text(
            Point::new(layout.width - layout.margins.right, 22.0),
            granularity,
            TextStyle::new(HEADING_COLOR, BODY_SIZE).anchored(TextAnchor::End),
        );
    }
}

fn draw_frame<B: RenderBackend>(backend: &mut B, frame: &ChartFrame, origin: Point) {
    let plot_width = frame.layout.plot_width();
    let plot_height = frame.layout.plot_height();
    let at = |x: f64, y: f64| Point::new(origin.x + x, origin.y + y);

    // x axis along the bottom of the plot
    backend.line(at(0.0, plot_height), at(plot_width, plot_height), AXIS_STROKE);
    let tick_style = TextStyle::new(AXIS_COLOR, TICK_SIZE).anchored(TextAnchor::Middle);
    for tick in &frame.x_ticks {
        backend.line(
            at(tick.position, plot_height),
            at(tick.position, plot_height + TICK_LENGTH),
            AXIS_STROKE,
        );
        backend.text(
            at(tick.position, plot_height + TICK_LENGTH + 12.0),
            &tick.label,
            tick_style,
        );
    }

    // y axis
    backend.line(at(0.0, 0.0), at(0.0, plot_height), AXIS_STROKE);
    let tick_style = TextStyle::new(AXIS_COLOR, TICK_SIZE).anchored(TextAnchor::End);
    for tick in &frame.y_ticks {
        backend.line(at(-TICK_LENGTH, tick.position), at(0.0, tick.position), AXIS_STROKE);
        backend.text(
            at(-TICK_LENGTH - 3.0, tick.position + 3.0),
            &tick.label,
            tick_style,
        );
    }
    if let Some(label) = &frame.y_axis_label {
        backend.text(
            at(-30.0, plot_height / 2.0),
            label,
            TextStyle::new(AXIS_COLOR, BODY_SIZE)
                .anchored(TextAnchor::Middle)
                .rotated(-90.0),
        );
    }

    let path: Vec<PathCommand> = frame.path.iter().map(|c| translate(c, origin)).collect();
    backend.path(&path, SERIES_STROKE);

    for marker in &frame.markers {
        backend.circle(
            at(marker.center.x, marker.center.y),
            MARKER_RADIUS,
            SERIES_COLOR,
            MARKER_STROKE,
        );
    }
}

fn draw_overlay<B: RenderBackend>(
    backend: &mut B,
    overlay: &HoverOverlay,
    frame: &ChartFrame,
    origin: Point,
) {
    let plot_height = frame.layout.plot_height();
    backend.line(
        Point::new(origin.x + overlay.guide_x, origin.y),
        Point::new(origin.x + overlay.guide_x, origin.y + plot_height),
        GUIDE_STROKE,
    );
    backend.circle(
        Point::new(origin.x + overlay.marker.x, origin.y + overlay.marker.y),
        overlay.marker_radius,
        SERIES_COLOR,
        Stroke::solid(MARKER_OUTLINE, overlay.marker_stroke),
    );

    // Panel coordinates are relative to the chart, below the header
    let panel = &overlay.panel;
    let top = HEADER_HEIGHT + panel.top;
    backend.rect(
        Point::new(panel.left, top),
        panel.width,
        panel.height,
        PANEL_BACKGROUND,
        Some(PANEL_STROKE),
    );
    let x = panel.left + 12.0;
    let mut y = top + 12.0 + PANEL_LINE_HEIGHT * 0.75;
    backend.text(
        Point::new(x, y),
        &panel.title,
        TextStyle::new(HEADING_COLOR, 14.0).bold(),
    );
    for line in &panel.lines {
        y += PANEL_LINE_HEIGHT;
        backend.text(Point::new(x, y), line, TextStyle::new(MUTED_COLOR, BODY_SIZE));
    }
}

fn translate(command: &PathCommand, by: Point) -> PathCommand {
    let shift = |p: Point| Point::new(p.x + by.x, p.y + by.y);
    match *command {
        PathCommand::MoveTo(p) => PathCommand::MoveTo(shift(p)),
        PathCommand::LineTo(p) => PathCommand::LineTo(shift(p)),
        PathCommand::CubicTo(c1, c2, p) => PathCommand::CubicTo(shift(c1), shift(c2), shift(p)),
    }
}
