//! Renderer trait abstraction.

use duoline_core::scene::Scene;
use duoline_core::{Label, Pixel, Primitive};
use kurbo::{Affine, Rect};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a Scene,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
    /// Stroke color of host-rendered lines.
    pub line_color: Color,
    /// Stroke width of host-rendered lines.
    pub line_width: f64,
    /// Color of label text.
    pub text_color: Color,
    /// Label font size.
    pub font_size: f32,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            scale_factor: 1.0,
            background_color: Color::WHITE,
            line_color: Color::BLACK,
            line_width: 1.0,
            text_color: Color::BLACK,
            font_size: 13.0,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set how host-rendered lines are stroked.
    pub fn with_line_style(mut self, color: Color, width: f64) -> Self {
        self.line_color = color;
        self.line_width = width;
        self
    }

    /// Transform from scene coordinates to physical pixels.
    pub fn view_transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the command buffer for a frame.
    ///
    /// Called once per frame; paints every scene entry in z-order.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

/// The unit square covered by a pixel.
pub fn pixel_rect(pixel: Pixel) -> Rect {
    let x = f64::from(pixel.x);
    let y = f64::from(pixel.y);
    Rect::new(x, y, x + 1.0, y + 1.0)
}

/// Scene transform for a label's local frame.
///
/// A label attached to a line item moves and turns with it; any other label
/// is only translated to its position.
pub fn label_transform(scene: &Scene, label: &Label) -> Affine {
    let local = Affine::translate(label.position.to_vec2());
    label
        .parent
        .and_then(|parent| scene.primitive(parent))
        .and_then(Primitive::as_line)
        .map_or(local, |item| item.transform() * local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoline_core::{LineItem, Surface};
    use kurbo::{Line as KurboLine, Point, Vec2};

    #[test]
    fn test_context_defaults() {
        let scene = Scene::with_size(550.0, 550.0);
        let ctx = RenderContext::new(&scene)
            .with_scale_factor(2.0)
            .with_line_style(Color::BLACK, 2.0);
        assert_eq!(ctx.view_transform() * Point::new(10.0, 5.0), Point::new(20.0, 10.0));
        assert!((ctx.line_width - 2.0).abs() < f64::EPSILON);
    }

    struct Blank;

    impl Renderer for Blank {
        fn build_scene(&mut self, _ctx: &RenderContext) {}
    }

    #[test]
    fn test_background_from_context() {
        let scene = Scene::with_size(10.0, 10.0);
        let ctx = RenderContext::new(&scene);
        assert_eq!(Blank.background_color(&ctx).components, Color::WHITE.components);

        let ctx = ctx.with_background(Color::BLACK);
        assert_eq!(Blank.background_color(&ctx).components, Color::BLACK.components);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(RendererError::Surface("lost".into()).to_string(), "Surface error: lost");
        assert_eq!(
            RendererError::InitFailed("no adapter".into()).to_string(),
            "Initialization failed: no adapter"
        );
    }

    #[test]
    fn test_pixel_rect() {
        let rect = pixel_rect(Pixel::new(-3, 7));
        assert_eq!(rect, Rect::new(-3.0, 7.0, -2.0, 8.0));
    }

    #[test]
    fn test_free_label_transform() {
        let scene = Scene::with_size(100.0, 100.0);
        let label = Label::new("free", Point::new(12.0, 34.0));
        let transform = label_transform(&scene, &label);
        assert_eq!(transform * Point::ZERO, Point::new(12.0, 34.0));
    }

    #[test]
    fn test_attached_label_follows_item() {
        let mut scene = Scene::with_size(550.0, 550.0);
        let mut item = LineItem::new(KurboLine::new((100.0, 100.0), (200.0, 100.0)));
        item.offset = Vec2::new(0.0, 50.0);
        item.rotation = 90.0;
        let parent = scene.add_primitive(Primitive::Line(item));

        let label = Label::attached("B1", Point::new(200.0, 100.0), parent);
        let origin = label_transform(&scene, &label) * Point::ZERO;
        assert!((origin - Point::new(100.0, 250.0)).hypot() < 1e-9);
        assert!((origin - scene.resolve_label(&label)).hypot() < 1e-9);
    }
}
