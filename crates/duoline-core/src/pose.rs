//! Polar pose of a self-rendering line.

use kurbo::{Line as KurboLine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Position, length and direction of a segment.
///
/// The angle is in degrees and is never normalized: repeated rotation may push
/// it past 360 or below 0. It is only ever read through sine and cosine, so the
/// derived endpoint does not depend on normalization. Coordinates are y-down,
/// which makes a positive angle turn clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// First endpoint and rotation pivot.
    pub origin: Point,
    /// Distance from the origin to the second endpoint.
    pub length: f64,
    /// Direction in degrees.
    pub angle: f64,
}

impl Pose {
    /// Create a pose from its parts. Negative lengths floor to zero.
    pub fn new(origin: Point, length: f64, angle: f64) -> Self {
        Self {
            origin,
            length: length.max(0.0),
            angle,
        }
    }

    /// Build a pose from a segment.
    pub fn from_line(line: KurboLine) -> Self {
        let delta = line.p1 - line.p0;
        Self::new(line.p0, delta.hypot(), delta.y.atan2(delta.x).to_degrees())
    }

    /// Unit vector pointing from the origin toward the second endpoint.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle.to_radians())
    }

    /// The derived second endpoint.
    pub fn end(&self) -> Point {
        self.origin + self.direction() * self.length
    }

    /// The pose as a segment.
    pub fn as_line(&self) -> KurboLine {
        KurboLine::new(self.origin, self.end())
    }

    /// Tight bounding box of the segment.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.origin, self.end())
    }

    /// Move the origin.
    pub fn translate(&mut self, delta: Vec2) {
        self.origin += delta;
    }

    /// Turn by `degrees` (positive is clockwise on screen).
    pub fn rotate(&mut self, degrees: f64) {
        self.angle += degrees;
    }

    /// Change the length by `delta`, never going below `min_length`.
    pub fn resize(&mut self, delta: f64, min_length: f64) {
        self.length = (self.length + delta).max(min_length);
    }
}
