//! Host surface contract.
//!
//! A surface is the drawable container lines register their primitives and
//! labels with. Lines never hold raw handles: every entry they add is owned by
//! a [`Registration`], which removes it again when dropped.

use crate::raster::{Painter, Pixel};
use kurbo::{Affine, Line as KurboLine, Point, Rect, Vec2};
use peniko::Color;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier for surface entries.
pub type SurfaceHandle = Uuid;

/// Shared, single-threaded access to a surface.
///
/// The session owns the surface and hands clones of this to every line, so the
/// surface outlives all registrations made against it.
pub type SharedSurface = Rc<RefCell<dyn Surface>>;

/// A native line primitive owned by the host.
///
/// The host renders and transforms it; the segment itself stays in local
/// coordinates and [`LineItem::transform`] maps it into the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Segment in local coordinates.
    pub line: KurboLine,
    /// Translation accumulated by moves.
    pub offset: Vec2,
    /// Absolute rotation in degrees (positive is clockwise on screen).
    pub rotation: f64,
    /// Rotation pivot in local coordinates.
    pub pivot: Point,
}

impl LineItem {
    /// Create an item at `line` with the pivot on its first endpoint.
    pub fn new(line: KurboLine) -> Self {
        Self {
            line,
            offset: Vec2::ZERO,
            rotation: 0.0,
            pivot: line.p0,
        }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.line.p1 - self.line.p0).hypot()
    }

    /// Local-to-scene transform: rotate about the pivot, then translate.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::rotate_about(self.rotation.to_radians(), self.pivot)
    }

    /// Map a point from local to scene coordinates.
    pub fn map_to_scene(&self, point: Point) -> Point {
        self.transform() * point
    }

    /// The segment in scene coordinates.
    pub fn scene_line(&self) -> KurboLine {
        let transform = self.transform();
        KurboLine::new(transform * self.line.p0, transform * self.line.p1)
    }
}

/// A text annotation produced by a raster pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Where the text starts, in scene coordinates.
    pub anchor: Point,
    pub text: String,
}

/// Output of one self-rendering pass.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    /// Region cleared before the pixels are drawn.
    pub background: Option<(Rect, Color)>,
    /// Color of every pixel in the layer.
    pub pen: Color,
    /// Pixels in emission order.
    pub pixels: Vec<Pixel>,
    /// Text drawn on top of the pixels.
    pub annotations: Vec<Annotation>,
}

impl RasterLayer {
    /// Create an empty layer drawing with `pen`.
    pub fn new(pen: Color) -> Self {
        Self {
            background: None,
            pen,
            pixels: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Drop everything drawn so far, keeping the pen.
    pub fn clear(&mut self) {
        self.background = None;
        self.pixels.clear();
        self.annotations.clear();
    }
}

impl Painter for RasterLayer {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.background = Some((rect, color));
    }

    fn draw_point(&mut self, pixel: Pixel) {
        self.pixels.push(pixel);
    }

    fn draw_text(&mut self, anchor: Point, text: &str) {
        self.annotations.push(Annotation {
            anchor,
            text: text.to_string(),
        });
    }
}

/// Drawable geometry a surface can hold.
#[derive(Debug, Clone)]
pub enum Primitive {
    /// A host-rendered line.
    Line(LineItem),
    /// Pixels produced by a self-rendering line.
    Raster(RasterLayer),
}

impl Primitive {
    pub fn as_line(&self) -> Option<&LineItem> {
        match self {
            Primitive::Line(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut LineItem> {
        match self {
            Primitive::Line(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_raster(&self) -> Option<&RasterLayer> {
        match self {
            Primitive::Raster(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_raster_mut(&mut self) -> Option<&mut RasterLayer> {
        match self {
            Primitive::Raster(layer) => Some(layer),
            _ => None,
        }
    }
}

/// A text label, optionally attached to a primitive.
///
/// A parented label's position is in the parent's local coordinates and moves
/// rigidly with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: Point,
    pub parent: Option<SurfaceHandle>,
}

impl Label {
    /// A free-standing label at a scene position.
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            position,
            parent: None,
        }
    }

    /// A label attached to `parent` at a local position.
    pub fn attached(text: impl Into<String>, position: Point, parent: SurfaceHandle) -> Self {
        Self {
            text: text.into(),
            position,
            parent: Some(parent),
        }
    }
}

/// The drawing surface lines register with.
pub trait Surface {
    /// Add a primitive on top of everything else.
    fn add_primitive(&mut self, primitive: Primitive) -> SurfaceHandle;

    /// Add a label on top of everything else.
    fn add_label(&mut self, label: Label) -> SurfaceHandle;

    /// Remove an entry. Returns false if the handle is unknown.
    fn remove(&mut self, handle: SurfaceHandle) -> bool;

    /// Full extent of the drawable area.
    fn scene_extent(&self) -> Rect;

    /// Mutable access to a primitive.
    fn primitive_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Primitive>;

    /// Mutable access to a label.
    fn label_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Label>;

    /// Ask the host to repaint.
    fn request_redraw(&mut self);

    /// Queue `handle` for removal while the surface is only shared-borrowed.
    /// The entry goes away on the surface's next mutation.
    fn release_later(&self, handle: SurfaceHandle);
}

/// Ownership of one surface entry.
///
/// The entry lives exactly as long as the registration: dropping it removes
/// the entry from the surface once.
///
/// Dropping while the surface is shared-borrowed (a renderer reading the
/// scene) queues the removal through [`Surface::release_later`]; the entry
/// stays visible to that reader and is gone after the next mutation. Dropping
/// while the surface is mutably borrowed cannot release anything and is a
/// bug: debug builds panic, release builds log an error and keep the entry.
pub struct Registration {
    surface: SharedSurface,
    handle: SurfaceHandle,
}

impl Registration {
    /// Register a primitive with `surface`.
    pub fn primitive(surface: &SharedSurface, primitive: Primitive) -> Self {
        let handle = surface.borrow_mut().add_primitive(primitive);
        Self {
            surface: Rc::clone(surface),
            handle,
        }
    }

    /// Register a label with `surface`.
    pub fn label(surface: &SharedSurface, label: Label) -> Self {
        let handle = surface.borrow_mut().add_label(label);
        Self {
            surface: Rc::clone(surface),
            handle,
        }
    }

    /// Handle of the owned entry.
    pub fn handle(&self) -> SurfaceHandle {
        self.handle
    }

    /// Extent of the surface the entry lives on.
    pub fn scene_extent(&self) -> Rect {
        self.surface.borrow().scene_extent()
    }

    /// Run `f` on the owned primitive. Returns `None` if this registration
    /// does not own a primitive.
    pub fn with_primitive<R>(&self, f: impl FnOnce(&mut Primitive) -> R) -> Option<R> {
        let mut surface = self.surface.borrow_mut();
        let result = surface.primitive_mut(self.handle).map(f);
        result
    }

    /// Run `f` on the owned label. Returns `None` if this registration does
    /// not own a label.
    pub fn with_label<R>(&self, f: impl FnOnce(&mut Label) -> R) -> Option<R> {
        let mut surface = self.surface.borrow_mut();
        let result = surface.label_mut(self.handle).map(f);
        result
    }

    /// Ask the surface to repaint.
    pub fn request_redraw(&self) {
        self.surface.borrow_mut().request_redraw();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        match self.surface.try_borrow_mut() {
            Ok(mut surface) => {
                if !surface.remove(self.handle) {
                    log::trace!("Surface entry {} already gone", self.handle);
                }
            }
            Err(_) => match self.surface.try_borrow() {
                Ok(surface) => {
                    log::debug!("Surface busy, deferring release of {}", self.handle);
                    surface.release_later(self.handle);
                }
                Err(_) => {
                    log::error!("Surface mutably borrowed while releasing {}, entry leaked", self.handle);
                    debug_assert!(
                        std::thread::panicking(),
                        "registration dropped while its surface is mutably borrowed"
                    );
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn shared_scene() -> (Rc<RefCell<Scene>>, SharedSurface) {
        let scene = Rc::new(RefCell::new(Scene::with_size(100.0, 100.0)));
        let surface: SharedSurface = scene.clone();
        (scene, surface)
    }

    #[test]
    fn test_line_item_identity() {
        let item = LineItem::new(KurboLine::new((1.0, 2.0), (5.0, 2.0)));
        assert_eq!(item.scene_line(), item.line);
        assert_eq!(item.pivot, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_line_item_rotates_about_pivot() {
        let mut item = LineItem::new(KurboLine::new((10.0, 10.0), (20.0, 10.0)));
        item.rotation = 90.0;
        let line = item.scene_line();
        assert!((line.p0.x - 10.0).abs() < 1e-10);
        assert!((line.p0.y - 10.0).abs() < 1e-10);
        assert!((line.p1.x - 10.0).abs() < 1e-10);
        assert!((line.p1.y - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_line_item_offset_after_rotation() {
        let mut item = LineItem::new(KurboLine::new((0.0, 0.0), (10.0, 0.0)));
        item.rotation = 180.0;
        item.offset = Vec2::new(5.0, 5.0);
        let end = item.map_to_scene(item.line.p1);
        assert!((end.x + 5.0).abs() < 1e-10);
        assert!((end.y - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_registration_removes_on_drop() {
        let (scene, surface) = shared_scene();
        {
            let registration = Registration::primitive(
                &surface,
                Primitive::Raster(RasterLayer::new(Color::BLACK)),
            );
            assert!(scene.borrow().get(registration.handle()).is_some());
            assert_eq!(scene.borrow().len(), 1);
        }
        assert!(scene.borrow().is_empty());
    }

    #[test]
    fn test_registration_tolerates_prior_removal() {
        let (scene, surface) = shared_scene();
        let registration = Registration::label(&surface, Label::new("x", Point::ZERO));
        assert!(scene.borrow_mut().remove(registration.handle()));
        drop(registration);
        assert!(scene.borrow().is_empty());
    }

    #[test]
    fn test_registration_defers_release_while_borrowed() {
        let (scene, surface) = shared_scene();
        let registration = Registration::label(&surface, Label::new("x", Point::ZERO));
        let handle = registration.handle();
        {
            let reader = scene.borrow();
            drop(registration);
            assert!(reader.get(handle).is_some());
        }
        assert!(scene.borrow().is_redraw_requested());
        scene.borrow_mut().take_redraw();
        assert!(scene.borrow().get(handle).is_none());
        assert!(scene.borrow().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "mutably borrowed")]
    fn test_registration_dropped_under_mutable_borrow() {
        let (scene, surface) = shared_scene();
        let registration = Registration::label(&surface, Label::new("x", Point::ZERO));
        let _guard = scene.borrow_mut();
        drop(registration);
    }

    #[test]
    fn test_with_primitive_on_label_is_none() {
        let (_scene, surface) = shared_scene();
        let registration = Registration::label(&surface, Label::new("x", Point::ZERO));
        assert!(registration.with_primitive(|_| ()).is_none());
        assert_eq!(registration.with_label(|label| label.text.clone()).as_deref(), Some("x"));
    }

    #[test]
    fn test_raster_layer_painter() {
        let mut layer = RasterLayer::new(Color::BLACK);
        layer.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE);
        layer.draw_point(Pixel::new(1, 1));
        layer.draw_text(Point::new(1.0, -4.0), "A2");
        assert!(layer.background.is_some());
        assert_eq!(layer.pixels, vec![Pixel::new(1, 1)]);
        assert_eq!(layer.annotations[0].text, "A2");

        layer.clear();
        assert!(layer.background.is_none());
        assert!(layer.pixels.is_empty());
        assert!(layer.annotations.is_empty());
    }
}
