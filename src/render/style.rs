//! Dashboard palette and stroke styles

use plotters::style::RGBColor;

/// Series line and markers
pub const SERIES_COLOR: RGBColor = RGBColor(0x00, 0x7b, 0xff);
/// Titles and panel headings
pub const HEADING_COLOR: RGBColor = RGBColor(0x2c, 0x3e, 0x50);
/// Subtitles, loading text, guide line
pub const MUTED_COLOR: RGBColor = RGBColor(0x6c, 0x75, 0x7d);
pub const AXIS_COLOR: RGBColor = RGBColor(0x33, 0x33, 0x33);
pub const ERROR_COLOR: RGBColor = RGBColor(0xdc, 0x35, 0x45);
pub const ERROR_BACKGROUND: RGBColor = RGBColor(0xf8, 0xd7, 0xda);
pub const PANEL_BACKGROUND: RGBColor = RGBColor(0xff, 0xff, 0xff);
pub const PANEL_BORDER: RGBColor = RGBColor(0xde, 0xe2, 0xe6);
pub const MARKER_OUTLINE: RGBColor = RGBColor(0xff, 0xff, 0xff);

pub const FONT_FAMILY: &str = "sans-serif";
pub const TITLE_SIZE: f64 = 18.0;
pub const BODY_SIZE: f64 = 13.0;
pub const TICK_SIZE: f64 = 10.0;

/// Outline of a shape or line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: RGBColor,
    pub width: f64,
    /// Dash and gap lengths in pixels
    pub dash: Option<(f64, f64)>,
}

impl Stroke {
    pub const fn solid(color: RGBColor, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub const fn dashed(color: RGBColor, width: f64, dash: f64, gap: f64) -> Self {
        Self {
            color,
            width,
            dash: Some((dash, gap)),
        }
    }
}

pub const SERIES_STROKE: Stroke = Stroke::solid(SERIES_COLOR, 2.0);
pub const MARKER_STROKE: Stroke = Stroke::solid(MARKER_OUTLINE, 1.5);
pub const AXIS_STROKE: Stroke = Stroke::solid(AXIS_COLOR, 1.0);
pub const GUIDE_STROKE: Stroke = Stroke::dashed(MUTED_COLOR, 1.0, 3.0, 3.0);
pub const PANEL_STROKE: Stroke = Stroke::solid(PANEL_BORDER, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: RGBColor,
    pub size: f64,
    pub anchor: TextAnchor,
    pub bold: bool,
    /// Rotation in degrees around the text origin
    pub rotate: f64,
}

impl TextStyle {
    pub const fn new(color: RGBColor, size: f64) -> Self {
        Self {
            color,
            size,
            anchor: TextAnchor::Start,
            bold: false,
            rotate: 0.0,
        }
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn rotated(mut self, degrees: f64) -> Self {
        self.rotate = degrees;
        self
    }
}
