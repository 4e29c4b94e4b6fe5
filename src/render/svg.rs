//! SVG backend
//!
//! Records primitives while a view is drawn, then replays them onto a
//! plotters [`SVGBackend`] writing into a string.

use super::style::{Stroke, TextAnchor, TextStyle, FONT_FAMILY};
use super::RenderBackend;
use crate::error::ChartError;
use crate::layout::{PathCommand, Point};
use plotters::backend::{DrawingBackend, SVGBackend};
use plotters_backend::{BackendCoord, DrawingErrorKind};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color, FontDesc, FontFamily, FontStyle, FontTransform, RGBColor, ShapeStyle};

/// Points sampled along each cubic segment of the series curve
const CURVE_STEPS: usize = 12;

#[derive(Debug, Clone)]
enum Primitive {
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: RGBColor,
        stroke: Stroke,
    },
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        fill: RGBColor,
        stroke: Option<Stroke>,
    },
    Text {
        at: Point,
        content: String,
        style: TextStyle,
    },
}

/// Renders charts to an SVG document
#[derive(Debug, Default)]
pub struct SvgBackend {
    width: f64,
    height: f64,
    primitives: Vec<Primitive>,
}

impl SvgBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for SvgBackend {
    type Output = Result<String, ChartError>;

    fn begin(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.primitives.clear();
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        match stroke.dash {
            Some((dash, gap)) => {
                for (from, to) in dash_segments(from, to, dash, gap) {
                    self.primitives.push(Primitive::Line { from, to, stroke });
                }
            }
            None => self.primitives.push(Primitive::Line { from, to, stroke }),
        }
    }

    fn path(&mut self, commands: &[PathCommand], stroke: Stroke) {
        for points in flatten(commands) {
            if points.len() > 1 {
                self.primitives.push(Primitive::Polyline { points, stroke });
            }
        }
    }

    fn circle(&mut self, center: Point, radius: f64, fill: RGBColor, stroke: Stroke) {
        self.primitives.push(Primitive::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn rect(&mut self, origin: Point, width: f64, height: f64, fill: RGBColor, stroke: Option<Stroke>) {
        self.primitives.push(Primitive::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
        });
    }

    fn text(&mut self, at: Point, content: &str, style: TextStyle) {
        self.primitives.push(Primitive::Text {
            at,
            content: content.to_string(),
            style,
        });
    }

    fn finish(self) -> Result<String, ChartError> {
        let size = (pixels(self.width), pixels(self.height));
        let mut document = String::new();
        {
            let mut svg = SVGBackend::with_string(&mut document, size);
            for primitive in &self.primitives {
                replay(&mut svg, primitive).map_err(render_error)?;
            }
            svg.present().map_err(render_error)?;
        }
        Ok(document)
    }
}

/// Draw one recorded primitive onto a plotters backend
fn replay<DB: DrawingBackend>(
    target: &mut DB,
    primitive: &Primitive,
) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
    match primitive {
        Primitive::Line { from, to, stroke } => {
            target.draw_line(coord(*from), coord(*to), &shape(stroke))
        }
        Primitive::Polyline { points, stroke } => {
            target.draw_path(points.iter().map(|p| coord(*p)), &shape(stroke))
        }
        Primitive::Circle {
            center,
            radius,
            fill,
            stroke,
        } => {
            let radius = pixels(*radius);
            target.draw_circle(coord(*center), radius, &fill.filled(), true)?;
            target.draw_circle(coord(*center), radius, &shape(stroke), false)
        }
        Primitive::Rect {
            origin,
            width,
            height,
            fill,
            stroke,
        } => {
            let upper_left = coord(*origin);
            let bottom_right = coord(Point::new(origin.x + width, origin.y + height));
            target.draw_rect(upper_left, bottom_right, &fill.filled(), true)?;
            match stroke {
                Some(stroke) => target.draw_rect(upper_left, bottom_right, &shape(stroke), false),
                None => Ok(()),
            }
        }
        Primitive::Text { at, content, style } => {
            let weight = if style.bold {
                FontStyle::Bold
            } else {
                FontStyle::Normal
            };
            let h_pos = match style.anchor {
                TextAnchor::Start => HPos::Left,
                TextAnchor::Middle => HPos::Center,
                TextAnchor::End => HPos::Right,
            };
            let font = FontDesc::new(FontFamily::from(FONT_FAMILY), style.size, weight)
                .transform(quarter_turn(style.rotate));
            let text_style = font
                .color(&style.color)
                .pos(Pos::new(h_pos, VPos::Bottom));
            target.draw_text(content, &text_style, coord(*at))
        }
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::RenderError(e.to_string())
}

fn shape(stroke: &Stroke) -> ShapeStyle {
    stroke.color.stroke_width(pixels(stroke.width).max(1))
}

fn coord(p: Point) -> BackendCoord {
    (p.x.round() as i32, p.y.round() as i32)
}

fn pixels(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

/// Nearest text rotation plotters can express
fn quarter_turn(degrees: f64) -> FontTransform {
    match (degrees / 90.0).round().rem_euclid(4.0) as u8 {
        1 => FontTransform::Rotate90,
        2 => FontTransform::Rotate180,
        3 => FontTransform::Rotate270,
        _ => FontTransform::None,
    }
}

/// Split `from`-`to` into dash segments of `dash` pixels separated by `gap`
fn dash_segments(from: Point, to: Point, dash: f64, gap: f64) -> Vec<(Point, Point)> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 || dash <= 0.0 {
        return vec![(from, to)];
    }

    let at = |d: f64| Point::new(from.x + dx * d / length, from.y + dy * d / length);
    let mut segments = Vec::new();
    let mut start = 0.0;
    while start < length {
        let end = (start + dash).min(length);
        segments.push((at(start), at(end)));
        start = end + gap.max(0.0);
    }
    segments
}

/// Flatten path commands into polylines, one per subpath
fn flatten(commands: &[PathCommand]) -> Vec<Vec<Point>> {
    let mut subpaths: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if !current.is_empty() {
                    subpaths.push(std::mem::take(&mut current));
                }
                current.push(p);
            }
            PathCommand::LineTo(p) => current.push(p),
            PathCommand::CubicTo(c1, c2, p) => {
                let start = current.last().copied().unwrap_or(c1);
                for step in 1..=CURVE_STEPS {
                    let t = step as f64 / CURVE_STEPS as f64;
                    current.push(cubic_point(start, c1, c2, p, t));
                }
            }
        }
    }
    if !current.is_empty() {
        subpaths.push(current);
    }
    subpaths
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p1.x,
        a * p0.y + b * c1.y + c * c2.y + d * p1.y,
    )
}
