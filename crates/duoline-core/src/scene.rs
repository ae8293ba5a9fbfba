//! Retained scene: the in-memory surface the demo renders from.

use crate::surface::{Label, Primitive, Surface, SurfaceHandle};
use kurbo::{Point, Rect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

/// An entry in the scene.
#[derive(Debug, Clone)]
pub enum SceneItem {
    Primitive(Primitive),
    Label(Label),
}

impl SceneItem {
    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            SceneItem::Primitive(primitive) => Some(primitive),
            SceneItem::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            SceneItem::Label(label) => Some(label),
            SceneItem::Primitive(_) => None,
        }
    }
}

/// Primitives and labels in z-order over a fixed extent.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Drawable area.
    extent: Rect,
    /// All entries, keyed by handle.
    items: HashMap<SurfaceHandle, SceneItem>,
    /// Paint order of entries (back to front).
    z_order: Vec<SurfaceHandle>,
    /// Set when something changed since the last [`Scene::take_redraw`].
    redraw_requested: bool,
    /// Handles released while the scene was borrowed for reading.
    pending_release: RefCell<Vec<SurfaceHandle>>,
}

impl Scene {
    /// Create an empty scene covering `extent`.
    pub fn new(extent: Rect) -> Self {
        Self {
            extent,
            items: HashMap::new(),
            z_order: Vec::new(),
            redraw_requested: false,
            pending_release: RefCell::new(Vec::new()),
        }
    }

    /// Create an empty scene covering `(0, 0)`–`(width, height)`.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self::new(Rect::new(0.0, 0.0, width, height))
    }

    /// Wrap the scene for sharing with lines.
    pub fn into_shared(self) -> Rc<RefCell<Scene>> {
        Rc::new(RefCell::new(self))
    }

    /// Get an entry by handle.
    pub fn get(&self, handle: SurfaceHandle) -> Option<&SceneItem> {
        self.items.get(&handle)
    }

    /// Get a primitive by handle.
    pub fn primitive(&self, handle: SurfaceHandle) -> Option<&Primitive> {
        self.items.get(&handle).and_then(SceneItem::as_primitive)
    }

    /// Get a label by handle.
    pub fn label(&self, handle: SurfaceHandle) -> Option<&Label> {
        self.items.get(&handle).and_then(SceneItem::as_label)
    }

    /// Entries in paint order (back to front).
    pub fn items_ordered(&self) -> impl Iterator<Item = (SurfaceHandle, &SceneItem)> {
        self.z_order
            .iter()
            .filter_map(|handle| self.items.get(handle).map(|item| (*handle, item)))
    }

    /// Scene position of a label, resolved through its parent's transform.
    pub fn label_position(&self, handle: SurfaceHandle) -> Option<Point> {
        self.label(handle).map(|label| self.resolve_label(label))
    }

    /// Scene position of `label`.
    ///
    /// Labels attached to a line item follow its transform; labels without a
    /// parent, or whose parent is not a line, use their position as is.
    pub fn resolve_label(&self, label: &Label) -> Point {
        label
            .parent
            .and_then(|parent| self.primitive(parent))
            .and_then(Primitive::as_line)
            .map_or(label.position, |item| item.map_to_scene(label.position))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the scene has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a redraw is pending.
    pub fn is_redraw_requested(&self) -> bool {
        self.redraw_requested || !self.pending_release.borrow().is_empty()
    }

    /// Return and clear the pending redraw flag.
    ///
    /// Deferred removals are applied first.
    pub fn take_redraw(&mut self) -> bool {
        self.flush_released();
        std::mem::take(&mut self.redraw_requested)
    }

    fn flush_released(&mut self) {
        let pending = std::mem::take(self.pending_release.get_mut());
        for handle in pending {
            self.remove_now(handle);
        }
    }

    fn remove_now(&mut self, handle: SurfaceHandle) -> bool {
        if self.items.remove(&handle).is_none() {
            return false;
        }

        // Labels attached to a removed primitive go with it.
        let orphans: Vec<SurfaceHandle> = self
            .items
            .iter()
            .filter(|(_, item)| matches!(item, SceneItem::Label(label) if label.parent == Some(handle)))
            .map(|(child, _)| *child)
            .collect();
        for child in &orphans {
            self.items.remove(child);
        }

        self.z_order
            .retain(|entry| *entry != handle && !orphans.contains(entry));
        self.redraw_requested = true;
        true
    }

    fn insert(&mut self, item: SceneItem) -> SurfaceHandle {
        self.flush_released();
        let handle = Uuid::new_v4();
        self.z_order.push(handle);
        self.items.insert(handle, item);
        self.redraw_requested = true;
        handle
    }
}

impl Surface for Scene {
    fn add_primitive(&mut self, primitive: Primitive) -> SurfaceHandle {
        self.insert(SceneItem::Primitive(primitive))
    }

    fn add_label(&mut self, label: Label) -> SurfaceHandle {
        self.insert(SceneItem::Label(label))
    }

    fn remove(&mut self, handle: SurfaceHandle) -> bool {
        self.flush_released();
        self.remove_now(handle)
    }

    fn scene_extent(&self) -> Rect {
        self.extent
    }

    fn primitive_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Primitive> {
        match self.items.get_mut(&handle) {
            Some(SceneItem::Primitive(primitive)) => Some(primitive),
            _ => None,
        }
    }

    fn label_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Label> {
        match self.items.get_mut(&handle) {
            Some(SceneItem::Label(label)) => Some(label),
            _ => None,
        }
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn release_later(&self, handle: SurfaceHandle) {
        self.pending_release.borrow_mut().push(handle);
    }
}
