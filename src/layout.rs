//! Chart layout
//!
//! Turns aggregated data and scales into a declarative frame: axis ticks, the
//! line path and the point markers, all in plot-local pixels. Frames are pure
//! data; a render backend draws them.

use crate::aggregator::distinct_days;
use crate::format::{format_number, format_time_tick};
use crate::scale::{compute_scales, ChartGeometry};
use crate::types::AggregatedBucket;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Number of ticks requested on the time axis
pub const X_TICK_COUNT: usize = 5;
/// Number of ticks requested on the value axis
pub const Y_TICK_COUNT: usize = 10;

/// Marker radius at rest
pub const MARKER_RADIUS: f64 = 4.0;
/// Marker radius when hovered
pub const MARKER_RADIUS_ACTIVE: f64 = 6.0;

/// Space around the plot area, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 30.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Outer chart size and margins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotLayout {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margins: Margins,
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 300.0,
            margins: Margins::default(),
        }
    }
}

impl PlotLayout {
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Plot area width, never below one pixel
    pub fn plot_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(1.0)
    }

    /// Plot area height, never below one pixel
    pub fn plot_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(1.0)
    }

    /// Whether a plot-local point lies inside the plot area
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.plot_width()).contains(&x) && (0.0..=self.plot_height()).contains(&y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One command of a line path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier: two control points, then the end point
    CubicTo(Point, Point, Point),
}

/// Axis tick: pixel position along the axis and its label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Point marker for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub index: usize,
    pub center: Point,
}

/// Everything drawn for one data/granularity/size combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFrame {
    pub layout: PlotLayout,
    pub geometry: ChartGeometry,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub path: Vec<PathCommand>,
    pub markers: Vec<Marker>,
    pub y_axis_label: Option<String>,
}

impl ChartFrame {
    pub fn marker(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }
}

/// Build the frame for `data`. `None` when there is nothing to plot.
pub fn build_frame(
    data: &[AggregatedBucket],
    layout: PlotLayout,
    zone: &FixedOffset,
    y_axis_label: Option<&str>,
) -> Option<ChartFrame> {
    let geometry = compute_scales(data, layout.plot_width(), layout.plot_height())?;

    let points: Vec<Point> = data
        .iter()
        .map(|b| Point::new(geometry.x.map(&b.timestamp), geometry.y.map(b.value)))
        .collect();

    let multi_day = distinct_days(data, zone) > 1;
    let x_ticks = geometry
        .x
        .ticks(X_TICK_COUNT)
        .iter()
        .map(|t| Tick {
            position: geometry.x.map(t),
            label: format_time_tick(t, zone, multi_day),
        })
        .collect();

    let y_ticks = geometry
        .y
        .ticks(Y_TICK_COUNT)
        .into_iter()
        .map(|v| Tick {
            position: geometry.y.map(v),
            label: format_number(v),
        })
        .collect();

    let markers = points
        .iter()
        .enumerate()
        .map(|(index, center)| Marker {
            index,
            center: *center,
        })
        .collect();

    Some(ChartFrame {
        layout,
        geometry,
        x_ticks,
        y_ticks,
        path: monotone_path(&points),
        markers,
        y_axis_label: y_axis_label.map(str::to_string),
    })
}

/// Path through `points` using monotone cubic interpolation along x.
///
/// Tangents follow the Fritsch–Carlson construction, so the curve never
/// overshoots between two samples. Points must be sorted by x.
pub fn monotone_path(points: &[Point]) -> Vec<PathCommand> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut path = vec![PathCommand::MoveTo(*first)];
    match points.len() {
        1 => return path,
        2 => {
            path.push(PathCommand::LineTo(points[1]));
            return path;
        }
        _ => {}
    }

    let tangents = monotone_tangents(points);
    for i in 0..points.len() - 1 {
        let (p0, p1) = (points[i], points[i + 1]);
        let dx = (p1.x - p0.x) / 3.0;
        path.push(PathCommand::CubicTo(
            Point::new(p0.x + dx, p0.y + dx * tangents[i]),
            Point::new(p1.x - dx, p1.y - dx * tangents[i + 1]),
            p1,
        ));
    }
    path
}

/// Tangent (dy/dx) at each point; requires at least three points
fn monotone_tangents(points: &[Point]) -> Vec<f64> {
    let n = points.len();
    let mut tangents = vec![0.0; n];

    for i in 1..n - 1 {
        let h0 = points[i].x - points[i - 1].x;
        let h1 = points[i + 1].x - points[i].x;
        let s0 = secant(points[i - 1], points[i]);
        let s1 = secant(points[i], points[i + 1]);
        let p = if h0 + h1 != 0.0 {
            (s0 * h1 + s1 * h0) / (h0 + h1)
        } else {
            0.0
        };
        let t = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
        tangents[i] = if t.is_finite() { t } else { 0.0 };
    }

    tangents[0] = end_tangent(points[0], points[1], tangents[1]);
    tangents[n - 1] = end_tangent(points[n - 2], points[n - 1], tangents[n - 2]);
    tangents
}

/// One-sided tangent for an end point, from its neighbour's tangent
fn end_tangent(a: Point, b: Point, neighbour: f64) -> f64 {
    let h = b.x - a.x;
    if h == 0.0 {
        neighbour
    } else {
        (3.0 * (b.y - a.y) / h - neighbour) / 2.0
    }
}

fn secant(a: Point, b: Point) -> f64 {
    let h = b.x - a.x;
    if h == 0.0 {
        0.0
    } else {
        (b.y - a.y) / h
    }
}

fn sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
