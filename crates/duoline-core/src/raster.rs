//! Bresenham line rasterization.
//!
//! The rasterizer turns a segment with real endpoints into the integer pixels
//! that approximate it, using only incremental integer arithmetic. Segments are
//! split into two classes by slope magnitude:
//!
//! - **Shallow** (`|dy| < |dx|`): x is the driving axis, y follows.
//! - **Steep** (otherwise): y is the driving axis, x follows.
//!
//! Within each class the endpoints are ordered so the driving coordinate only
//! ever increases, which keeps the stepping loop a plain inclusive range.
//!
//! # References
//!
//! - Bresenham, J. E. (1965). "Algorithm for computer control of a digital plotter."

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Label placed on the first endpoint of a rasterized segment.
pub const START_LABEL: &str = "A2";
/// Label placed on the second endpoint of a rasterized segment.
pub const END_LABEL: &str = "B2";
/// Distance labels sit above their endpoint.
pub const LABEL_LIFT: f64 = 5.0;

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of the pixel cell as a point.
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// Sink for rasterizer output.
///
/// Implemented by anything that can receive single pixels and text
/// annotations, such as a raster layer stored in a scene.
pub trait Painter {
    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Plot one pixel with the current pen.
    fn draw_point(&mut self, pixel: Pixel);

    /// Draw a text annotation anchored at `anchor`.
    fn draw_text(&mut self, anchor: Point, text: &str);
}

/// Iterator over the pixels of one rasterized segment.
///
/// Cloning the iterator restarts the walk from wherever the clone was taken,
/// so a fresh [`rasterize`] result can be replayed any number of times.
#[derive(Debug, Clone)]
pub struct LinePixels {
    /// Whether y is the driving axis.
    steep: bool,
    /// Current coordinate on the driving axis.
    major: i64,
    /// Last coordinate on the driving axis (inclusive).
    major_end: i64,
    /// Current coordinate on the following axis.
    minor: i64,
    /// +1 or -1: direction the following axis moves in.
    minor_step: i64,
    /// Extent along the driving axis (non-negative).
    major_delta: i64,
    /// Extent along the following axis (non-negative).
    minor_delta: i64,
    /// Decision variable.
    error: i64,
}

impl LinePixels {
    /// Shallow case: x drives, requires `x1 <= x2`.
    fn line_low(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let sy = if dy < 0 { -1 } else { 1 };
        let dy = dy * sy;

        Self {
            steep: false,
            major: x1,
            major_end: x2,
            minor: y1,
            minor_step: sy,
            major_delta: dx,
            minor_delta: dy,
            error: 2 * dy - dx,
        }
    }

    /// Steep case: y drives, requires `y1 <= y2`.
    fn line_high(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let sx = if dx < 0 { -1 } else { 1 };
        let dx = dx * sx;

        Self {
            steep: true,
            major: y1,
            major_end: y2,
            minor: x1,
            minor_step: sx,
            major_delta: dy,
            minor_delta: dx,
            error: 2 * dx - dy,
        }
    }

    /// Whether y is the driving axis for this segment.
    pub fn is_steep(&self) -> bool {
        self.steep
    }

    fn remaining(&self) -> usize {
        if self.major > self.major_end {
            0
        } else {
            (self.major_end - self.major + 1) as usize
        }
    }
}

impl Iterator for LinePixels {
    type Item = Pixel;

    fn next(&mut self) -> Option<Pixel> {
        if self.major > self.major_end {
            return None;
        }

        let pixel = if self.steep {
            Pixel::new(self.minor as i32, self.major as i32)
        } else {
            Pixel::new(self.major as i32, self.minor as i32)
        };

        if self.error > 0 {
            self.minor += self.minor_step;
            self.error += 2 * (self.minor_delta - self.major_delta);
        } else {
            self.error += 2 * self.minor_delta;
        }
        self.major += 1;

        Some(pixel)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LinePixels {}

impl FusedIterator for LinePixels {}

/// Truncate a real coordinate toward zero, saturating at the `i32` range.
/// NaN maps to 0.
#[inline]
fn truncate(v: f64) -> i64 {
    i64::from(v as i32)
}

/// Rasterize the segment `start`–`end`.
///
/// Endpoints are truncated toward zero before stepping, and the slope class is
/// decided on the truncated values. Exactly one pixel is produced per integer
/// step along the driving axis, both endpoints included, so a degenerate
/// segment yields a single pixel.
pub fn rasterize(start: Point, end: Point) -> LinePixels {
    let (x1, y1) = (truncate(start.x), truncate(start.y));
    let (x2, y2) = (truncate(end.x), truncate(end.y));

    if (y2 - y1).abs() < (x2 - x1).abs() {
        if x1 > x2 {
            LinePixels::line_low(x2, y2, x1, y1)
        } else {
            LinePixels::line_low(x1, y1, x2, y2)
        }
    } else if y1 > y2 {
        LinePixels::line_high(x2, y2, x1, y1)
    } else {
        LinePixels::line_high(x1, y1, x2, y2)
    }
}

/// Painter adapter that drops pixels falling outside `region`.
///
/// Fills and text pass through unchanged.
pub struct Clipped<'a, P: Painter + ?Sized> {
    inner: &'a mut P,
    region: Rect,
}

impl<'a, P: Painter + ?Sized> Clipped<'a, P> {
    pub fn new(inner: &'a mut P, region: Rect) -> Self {
        Self { inner, region }
    }
}

impl<P: Painter + ?Sized> Painter for Clipped<'_, P> {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.inner.fill_rect(rect, color);
    }

    fn draw_point(&mut self, pixel: Pixel) {
        if self.region.contains(pixel.to_point()) {
            self.inner.draw_point(pixel);
        }
    }

    fn draw_text(&mut self, anchor: Point, text: &str) {
        self.inner.draw_text(anchor, text);
    }
}

/// Where the label for an endpoint goes: the truncated endpoint, lifted by
/// [`LABEL_LIFT`].
pub fn label_anchor(point: Point) -> Point {
    Point::new(
        truncate(point.x) as f64,
        truncate(point.y) as f64 - LABEL_LIFT,
    )
}

/// Rasterize `start`–`end` into `painter`, then label the endpoints.
///
/// The labels always go on the endpoints as given, regardless of the order
/// the stepping loop walked them in.
pub fn draw_line<P: Painter + ?Sized>(painter: &mut P, start: Point, end: Point) {
    for pixel in rasterize(start, end) {
        painter.draw_point(pixel);
    }

    painter.draw_text(label_anchor(start), START_LABEL);
    painter.draw_text(label_anchor(end), END_LABEL);
}
