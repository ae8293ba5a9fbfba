//! Line that rasterizes itself.

use super::{Line, LineKind};
use crate::config::ControlConfig;
use crate::pose::Pose;
use crate::raster::{Clipped, Painter, draw_line};
use crate::surface::{Primitive, RasterLayer, Registration, SharedSurface, SurfaceHandle};
use kurbo::{Line as KurboLine, Rect, Vec2};
use peniko::Color;
use peniko::color::palette;

/// Fill behind the rasterized pixels.
pub const BACKGROUND: Color = Color::WHITE;
/// Pixel color.
pub const PEN: Color = palette::css::RED;

/// A line that tracks its own pose and produces its own pixels.
///
/// It registers a single raster layer with the surface and rewrites that
/// layer after every change, so the surface always holds the pixels for the
/// current pose.
#[derive(Debug)]
pub struct RasterLine {
    pose: Pose,
    layer: Registration,
    controls: ControlConfig,
}

impl RasterLine {
    /// Register a raster layer and draw `segment` into it.
    pub fn new(surface: &SharedSurface, segment: KurboLine, controls: ControlConfig) -> Self {
        Self::with_pose(surface, Pose::from_line(segment), controls)
    }

    /// Register a raster layer and draw `pose` into it. A pose shorter than
    /// `controls.min_length` is lengthened to it.
    pub fn with_pose(surface: &SharedSurface, mut pose: Pose, controls: ControlConfig) -> Self {
        pose.length = pose.length.max(controls.min_length);
        let layer = Registration::primitive(surface, Primitive::Raster(RasterLayer::new(PEN)));
        log::debug!("Raster line {} created at {:?}", layer.handle(), pose);

        let line = Self {
            pose,
            layer,
            controls,
        };
        line.update();
        line
    }

    /// Handle of the registered raster layer.
    pub fn handle(&self) -> SurfaceHandle {
        self.layer.handle()
    }

    /// Current pose.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Region repainted on every pass: the whole surface.
    pub fn bounding_region(&self) -> Rect {
        self.layer.scene_extent()
    }

    /// Bounding box of the segment alone.
    pub fn tight_bounds(&self) -> Rect {
        self.pose.bounds()
    }

    /// Paint the current pose: clear the bounding region, rasterize the
    /// segment and label both ends. Pixels outside the region are dropped.
    pub fn render<P: Painter + ?Sized>(&self, painter: &mut P) {
        let region = self.bounding_region();
        painter.fill_rect(region, BACKGROUND);
        draw_line(&mut Clipped::new(painter, region), self.pose.origin, self.pose.end());
    }

    /// Snapshot of the registered layer.
    pub fn layer(&self) -> Option<RasterLayer> {
        self.layer
            .with_primitive(|primitive| primitive.as_raster().cloned())
            .flatten()
    }

    /// Re-render into the registered layer and ask for a repaint.
    fn update(&self) {
        let mut pass = RasterLayer::new(PEN);
        self.render(&mut pass);

        let stored = self
            .layer
            .with_primitive(|primitive| primitive.as_raster_mut().map(|layer| *layer = pass))
            .flatten();
        if stored.is_none() {
            log::warn!("Raster line {} lost its layer", self.layer.handle());
            return;
        }
        self.layer.request_redraw();
    }
}

impl Line for RasterLine {
    fn move_by(&mut self, dx: i32, dy: i32) {
        self.pose.translate(Vec2::new(f64::from(dx), f64::from(dy)));
        self.update();
    }

    fn rotate_clockwise(&mut self) {
        self.pose.rotate(self.controls.rotation_step);
        self.update();
    }

    fn rotate_counter_clockwise(&mut self) {
        self.pose.rotate(-self.controls.rotation_step);
        self.update();
    }

    fn resize(&mut self, delta: i32) {
        self.pose.resize(f64::from(delta), self.controls.min_length);
        self.update();
    }

    fn kind(&self) -> LineKind {
        LineKind::Raster
    }

    fn endpoints(&self) -> KurboLine {
        self.pose.as_line()
    }

    fn rotation(&self) -> f64 {
        self.pose.angle
    }

    fn length(&self) -> f64 {
        self.pose.length
    }
}
