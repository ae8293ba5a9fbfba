//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer, label_transform, pixel_rect};
use duoline_core::scene::SceneItem;
use duoline_core::{Label, LineItem, Pixel, Primitive, RasterLayer};
use kurbo::{Affine, BezPath, Rect, Shape as KurboShape, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Fill};
use vello::Scene;

/// Where a text layout is pinned to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextAnchor {
    /// Top-left corner of the layout box.
    TopLeft,
    /// Left end of the first baseline.
    Baseline,
}

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Font context for label text (system fonts, loaded once).
    font_cx: FontContext,
    /// Layout context for label text.
    layout_cx: LayoutContext<Brush>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// One path covering every pixel of a raster pass.
fn pixel_path(pixels: &[Pixel]) -> BezPath {
    let mut path = BezPath::new();
    for pixel in pixels {
        path.extend(pixel_rect(*pixel).path_elements(0.1));
    }
    path
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Stroke a host-owned line through its item transform.
    fn render_line_item(&mut self, item: &LineItem, transform: Affine, ctx: &RenderContext) {
        let stroke = Stroke::new(ctx.line_width);
        self.scene
            .stroke(&stroke, transform * item.transform(), ctx.line_color, None, &item.line);
    }

    /// Paint a raster pass: its cleared region, its pixels, then its text.
    fn render_raster(&mut self, layer: &RasterLayer, transform: Affine, ctx: &RenderContext) {
        if let Some((region, color)) = layer.background {
            self.scene.fill(Fill::NonZero, transform, color, None, &region);
        }

        if !layer.pixels.is_empty() {
            let path = pixel_path(&layer.pixels);
            self.scene.fill(Fill::NonZero, transform, layer.pen, None, &path);
        }

        for annotation in &layer.annotations {
            let placed = transform * Affine::translate(annotation.anchor.to_vec2());
            self.render_text(&annotation.text, placed, TextAnchor::Baseline, ctx);
        }
    }

    /// Draw a label in its parent's frame.
    fn render_label(&mut self, label: &Label, transform: Affine, ctx: &RenderContext) {
        let placed = transform * label_transform(ctx.scene, label);
        self.render_text(&label.text, placed, TextAnchor::TopLeft, ctx);
    }

    /// Lay out `text` and draw it with its anchor at the origin of `transform`.
    fn render_text(&mut self, text: &str, transform: Affine, anchor: TextAnchor, ctx: &RenderContext) {
        use parley::StyleProperty;

        if text.is_empty() {
            return;
        }

        let brush = Brush::Solid(ctx.text_color);
        let mut builder = self.layout_cx.ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(ctx.font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Source("sans-serif".into())));
        let mut layout = builder.build(text);

        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        let lift = match anchor {
            TextAnchor::TopLeft => 0.0,
            TextAnchor::Baseline => layout
                .lines()
                .next()
                .map_or(0.0, |line| f64::from(line.metrics().baseline)),
        };
        let text_transform = transform * Affine::translate((0.0, -lift));

        let mut glyph_count = 0;

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        glyph_count += 1;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }

        // No usable system font: mark the spot so the label is not silently lost.
        if glyph_count == 0 {
            log::trace!("No glyphs for label {:?}", text);
            let size = f64::from(ctx.font_size);
            let width = text.chars().count() as f64 * size * 0.6;
            let top = match anchor {
                TextAnchor::TopLeft => 0.0,
                TextAnchor::Baseline => -size,
            };
            let rect = Rect::new(0.0, top, width, top + size);
            self.scene.fill(Fill::NonZero, transform, ctx.text_color, None, &rect);
        }
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        let view = ctx.view_transform();

        for (_, item) in ctx.scene.items_ordered() {
            match item {
                SceneItem::Primitive(Primitive::Line(line)) => self.render_line_item(line, view, ctx),
                SceneItem::Primitive(Primitive::Raster(layer)) => self.render_raster(layer, view, ctx),
                SceneItem::Label(label) => self.render_label(label, view, ctx),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoline_core::{Controller, DemoConfig, SharedSurface};

    #[test]
    fn test_renderer_creation() {
        let renderer = VelloRenderer::new();
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_empty_scene() {
        let mut renderer = VelloRenderer::new();
        let scene = duoline_core::Scene::with_size(550.0, 550.0);
        let ctx = RenderContext::new(&scene);

        renderer.build_scene(&ctx);
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_demo_scene() {
        let mut renderer = VelloRenderer::new();
        let scene = duoline_core::Scene::with_size(550.0, 550.0).into_shared();
        let surface: SharedSurface = scene.clone();
        let _controller = Controller::demo(&surface, &DemoConfig::default());

        let scene = scene.borrow();
        let ctx = RenderContext::new(&scene);
        renderer.build_scene(&ctx);
        assert!(!renderer.scene().encoding().is_empty());

        let taken = renderer.take_scene();
        assert!(!taken.encoding().is_empty());
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_pixel_path_covers_pixels() {
        let pixels: Vec<Pixel> = (100..=200).map(|x| Pixel::new(x, 200)).collect();
        let bounds = pixel_path(&pixels).bounding_box();
        assert_eq!(bounds, Rect::new(100.0, 200.0, 201.0, 201.0));
    }
}
