//! Per-page layout objects produced by the content interpreter.

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Rgb};

/// A positioned character with its fill color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Char {
    pub text: String,
    pub bbox: BBox,
    pub color: Rgb,
}

impl Char {
    /// Baseline used for line bucketing and strike intersection.
    pub fn baseline(&self) -> f64 {
        self.bbox.bottom
    }
}

/// A stroked line segment. Registry tables are ruled with axis-aligned
/// segments; diagonal strokes are kept but ignored downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLine {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: Rgb,
}

impl RuleLine {
    const AXIS_TOLERANCE: f64 = 1.0;

    pub fn is_horizontal(&self) -> bool {
        (self.y1 - self.y0).abs() <= Self::AXIS_TOLERANCE
    }

    pub fn is_vertical(&self) -> bool {
        (self.x1 - self.x0).abs() <= Self::AXIS_TOLERANCE
    }

    pub fn y_mid(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }
}

/// A filled rectangle. Thin fills double as ruling lines in some producers,
/// including red strike marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub bbox: BBox,
    pub color: Rgb,
}

impl Rect {
    /// Height below which a fill is treated as a horizontal rule.
    pub const THIN: f64 = 2.5;

    pub fn is_thin_horizontal(&self) -> bool {
        self.bbox.height() <= Self::THIN && self.bbox.width() > self.bbox.height()
    }

    pub fn is_thin_vertical(&self) -> bool {
        self.bbox.width() <= Self::THIN && self.bbox.height() > self.bbox.width()
    }
}

/// Everything extracted from one page, watermark chars already removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub chars: Vec<Char>,
    pub lines: Vec<RuleLine>,
    pub rects: Vec<Rect>,
}

/// Extraction thresholds. Mirrors the engine-level parse configuration so
/// callers can thread tuned values through without this crate knowing about
/// the config file format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Chars with all RGB channels strictly inside this band are dropped
    /// as watermark ink.
    pub watermark_grey_min: f32,
    pub watermark_grey_max: f32,
    /// Red thresholds used to keep strike marks out of the structural grid.
    pub strike_red_min: f32,
    pub strike_other_max: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            watermark_grey_min: 0.5,
            watermark_grey_max: 1.0,
            strike_red_min: 0.7,
            strike_other_max: 0.3,
        }
    }
}
