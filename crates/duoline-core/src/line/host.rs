//! Line rendered by the host scene.

use super::{Line, LineKind};
use crate::config::ControlConfig;
use crate::surface::{Label, LineItem, Primitive, Registration, SharedSurface};
use kurbo::{Line as KurboLine, Point, Vec2};

/// Label on the pivot end.
pub const START_LABEL: &str = "A1";
/// Label on the free end.
pub const END_LABEL: &str = "B1";

/// A line that delegates drawing and transformation to the host.
///
/// The host primitive stores the segment in local coordinates together with
/// an offset and an absolute rotation about the first endpoint. Two labels are
/// attached to the primitive, so they follow every move and rotation; only the
/// end label needs repositioning after a resize.
#[derive(Debug)]
pub struct HostLine {
    // Declared before `item` so the labels are released first.
    start_label: Registration,
    end_label: Registration,
    item: Registration,
    /// Unit direction of the local segment, kept so a zero-length line can
    /// grow back along its original heading.
    direction: Vec2,
    controls: ControlConfig,
}

impl HostLine {
    /// Add a line primitive at `segment` with its two labels. A segment
    /// shorter than `controls.min_length` is extended along its direction.
    pub fn new(surface: &SharedSurface, segment: KurboLine, controls: ControlConfig) -> Self {
        let delta = segment.p1 - segment.p0;
        let direction = if delta.hypot2() > f64::EPSILON {
            delta.normalize()
        } else {
            Vec2::new(1.0, 0.0)
        };

        let mut segment = segment;
        if delta.hypot() < controls.min_length {
            segment.p1 = segment.p0 + direction * controls.min_length;
        }

        let item = Registration::primitive(surface, Primitive::Line(LineItem::new(segment)));
        let start_label = Registration::label(
            surface,
            Label::attached(START_LABEL, segment.p0, item.handle()),
        );
        let end_label = Registration::label(
            surface,
            Label::attached(END_LABEL, segment.p1, item.handle()),
        );

        log::debug!("Host line {} created at {:?}", item.handle(), segment);

        Self {
            start_label,
            end_label,
            item,
            direction,
            controls,
        }
    }

    /// Handle of the host primitive.
    pub fn handle(&self) -> crate::surface::SurfaceHandle {
        self.item.handle()
    }

    /// Snapshot of the host primitive.
    pub fn item(&self) -> Option<LineItem> {
        self.item
            .with_primitive(|primitive| primitive.as_line().cloned())
            .flatten()
    }

    /// Scene positions of the "A1" and "B1" labels.
    pub fn label_positions(&self) -> Option<(Point, Point)> {
        let item = self.item()?;
        let start = self.start_label.with_label(|label| label.position)?;
        let end = self.end_label.with_label(|label| label.position)?;
        Some((item.map_to_scene(start), item.map_to_scene(end)))
    }

    fn update(&self, f: impl FnOnce(&mut LineItem)) {
        let updated = self
            .item
            .with_primitive(|primitive| primitive.as_line_mut().map(f))
            .flatten();
        if updated.is_none() {
            log::warn!("Host line {} lost its primitive", self.item.handle());
            return;
        }
        self.item.request_redraw();
    }

    fn rotate_by(&mut self, degrees: f64) {
        self.update(|item| {
            let current = item.rotation;
            item.rotation = current + degrees;
        });
    }
}

impl Line for HostLine {
    fn move_by(&mut self, dx: i32, dy: i32) {
        self.update(|item| item.offset += Vec2::new(f64::from(dx), f64::from(dy)));
    }

    fn rotate_clockwise(&mut self) {
        self.rotate_by(self.controls.rotation_step);
    }

    fn rotate_counter_clockwise(&mut self) {
        self.rotate_by(-self.controls.rotation_step);
    }

    fn resize(&mut self, delta: i32) {
        let direction = self.direction;
        let min_length = self.controls.min_length;
        let mut end = None;

        self.update(|item| {
            let length = (item.length() + f64::from(delta)).max(min_length);
            item.line.p1 = item.line.p0 + direction * length;
            end = Some(item.line.p1);
        });

        if let Some(end) = end {
            self.end_label.with_label(|label| label.position = end);
        }
    }

    fn kind(&self) -> LineKind {
        LineKind::Host
    }

    fn endpoints(&self) -> KurboLine {
        self.item()
            .map(|item| item.scene_line())
            .unwrap_or(KurboLine::new(Point::ZERO, Point::ZERO))
    }

    fn rotation(&self) -> f64 {
        self.item().map_or(0.0, |item| item.rotation)
    }

    fn length(&self) -> f64 {
        self.item().map_or(0.0, |item| item.length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Rc<RefCell<Scene>>, HostLine) {
        let scene = Scene::with_size(550.0, 550.0).into_shared();
        let surface: SharedSurface = scene.clone();
        let line = HostLine::new(
            &surface,
            KurboLine::new((100.0, 100.0), (200.0, 100.0)),
            ControlConfig::default(),
        );
        (scene, line)
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_creation_registers_three_entries() {
        let (scene, line) = setup();
        assert_eq!(scene.borrow().len(), 3);

        let item = line.item().unwrap();
        assert_eq!(item.pivot, Point::new(100.0, 100.0));
        let (a, b) = line.label_positions().unwrap();
        assert_eq!(a, Point::new(100.0, 100.0));
        assert_eq!(b, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_move_roundtrip_exact() {
        let (_scene, mut line) = setup();
        let before = line.endpoints();
        line.move_by(37, -120);
        assert_eq!(line.endpoints().p0, Point::new(137.0, -20.0));
        line.move_by(-37, 120);
        assert_eq!(line.endpoints(), before);
    }

    #[test]
    fn test_labels_follow_move_and_rotation() {
        let (_scene, mut line) = setup();
        line.move_by(0, 100);
        line.rotate_clockwise();
        line.rotate_clockwise();
        line.rotate_clockwise();

        let (a, b) = line.label_positions().unwrap();
        assert!(close(a, Point::new(100.0, 200.0)));
        assert!(close(b, Point::new(100.0, 300.0)));
        let ends = line.endpoints();
        assert!(close(ends.p0, a));
        assert!(close(ends.p1, b));
    }

    #[test]
    fn test_rotation_is_absolute_accumulation() {
        let (_scene, mut line) = setup();
        line.rotate_counter_clockwise();
        line.rotate_counter_clockwise();
        assert!((line.rotation() + 60.0).abs() < 1e-10);
        line.rotate_clockwise();
        assert!((line.rotation() + 30.0).abs() < 1e-10);
        // Rotation never changes the pivot end or the length.
        assert!(close(line.endpoints().p0, Point::new(100.0, 100.0)));
        assert!((line.length() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_resize_moves_end_label_only() {
        let (_scene, mut line) = setup();
        line.resize(10);
        let (a, b) = line.label_positions().unwrap();
        assert_eq!(a, Point::new(100.0, 100.0));
        assert!(close(b, Point::new(210.0, 100.0)));
        assert!((line.length() - 110.0).abs() < 1e-10);
    }

    #[test]
    fn test_resize_floors_and_recovers_direction() {
        let (_scene, mut line) = setup();
        line.resize(-60);
        line.resize(-60);
        assert_eq!(line.length(), 0.0);
        line.resize(-10);
        assert_eq!(line.length(), 0.0);

        line.resize(25);
        assert!(close(line.endpoints().p1, Point::new(125.0, 100.0)));
    }

    #[test]
    fn test_resize_respects_min_length() {
        let scene = Scene::with_size(100.0, 100.0).into_shared();
        let surface: SharedSurface = scene.clone();
        let controls = ControlConfig {
            min_length: 1.0,
            ..ControlConfig::default()
        };
        let mut line = HostLine::new(&surface, KurboLine::new((0.0, 0.0), (0.0, 10.0)), controls);
        line.resize(-10);
        assert!((line.length() - 1.0).abs() < 1e-10);
        assert!(close(line.endpoints().p1, Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_drop_removes_everything() {
        let (scene, line) = setup();
        let handle = line.handle();
        scene.borrow_mut().take_redraw();
        drop(line);
        assert!(scene.borrow().is_empty());
        assert!(scene.borrow().get(handle).is_none());
        assert!(scene.borrow().is_redraw_requested());
    }

    #[test]
    fn test_mutation_requests_redraw() {
        let (scene, mut line) = setup();
        scene.borrow_mut().take_redraw();
        line.rotate_clockwise();
        assert!(scene.borrow_mut().take_redraw());
    }
}
