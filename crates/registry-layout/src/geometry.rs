//! Geometry primitives shared by the layout extractor.
//!
//! Coordinates are top-left based: `top` grows downward, so a char on the
//! first line of a page has a smaller `top` than one further down. PDF user
//! space is bottom-left based; the content interpreter flips y using the
//! page height.

use serde::{Deserialize, Serialize};

/// Device RGB color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

pub const BLACK: Rgb = Rgb {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};

impl Rgb {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Grey-band test used for watermark filtering: every channel strictly
    /// inside `(min, max)`.
    pub fn in_grey_band(&self, min: f32, max: f32) -> bool {
        let in_band = |c: f32| c > min && c < max;
        in_band(self.r) && in_band(self.g) && in_band(self.b)
    }

    /// Red test used for strike-through detection.
    pub fn is_reddish(&self, red_min: f32, other_max: f32) -> bool {
        self.r > red_min && self.g < other_max && self.b < other_max
    }
}

/// Axis-aligned box in top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }
}

/// 2D affine transform `[a b c d e f]` as used by `cm` and `Tm`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self * other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Effective vertical scale, used to size glyph boxes.
    pub fn y_scale(&self) -> f64 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grey_band_excludes_black_and_white() {
        assert!(Rgb::new(0.7, 0.7, 0.7).in_grey_band(0.5, 1.0));
        assert!(!BLACK.in_grey_band(0.5, 1.0));
        assert!(!Rgb::new(1.0, 1.0, 1.0).in_grey_band(0.5, 1.0));
        // One dark channel is enough to keep the char
        assert!(!Rgb::new(0.7, 0.2, 0.7).in_grey_band(0.5, 1.0));
    }

    #[test]
    fn test_reddish() {
        assert!(Rgb::new(1.0, 0.0, 0.0).is_reddish(0.7, 0.3));
        assert!(Rgb::new(0.8, 0.1, 0.1).is_reddish(0.7, 0.3));
        assert!(!BLACK.is_reddish(0.7, 0.3));
        assert!(!Rgb::new(0.8, 0.5, 0.1).is_reddish(0.7, 0.3));
    }

    #[test]
    fn test_matrix_translation_then_scale() {
        let t = Matrix::translation(10.0, 20.0);
        let s = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let m = t.then(&s);
        assert_eq!(m.apply(0.0, 0.0), (20.0, 40.0));
    }

    #[test]
    fn test_bbox_contains_point() {
        let b = BBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(b.contains_point(15.0, 15.0));
        assert!(!b.contains_point(25.0, 15.0));
    }
}
