//! Core application state and lifecycle.

use duoline_core::config::{ConfigError, ConfigResult};
use duoline_core::{Controller, DemoConfig, Label, Registration, Scene, SharedSurface, SurfaceHandle, command_for_key};
use duoline_render::{RenderContext, RenderResult, Renderer, RendererError, VelloRenderer};
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::shortcuts::ShortcutRegistry;

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "DUOLINE_CONFIG";

/// Distance of the controls legend from the scene's top-right corner.
const HELP_INSET: (f64, f64) = (200.0, 10.0);

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Window clear color as RGBA.
    pub background: [u8; 4],
    /// Draw the controls legend in the window.
    pub show_help: bool,
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Duoline".to_string(),
            width: 550,
            height: 550,
            background: [255, 255, 255, 255],
            show_help: true,
            demo: DemoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path`, falling back to defaults if it cannot be used.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            log::error!("Ignoring configuration {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Configuration from the file named by [`CONFIG_ENV`], or defaults.
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_or_default(path),
            None => Self::default(),
        }
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid {
                field: "width/height",
                reason: format!("window size {}x{} is empty", self.width, self.height),
            });
        }
        self.demo.validate()
    }

    /// Window clear color.
    pub fn background_color(&self) -> Color {
        let [r, g, b, a] = self.background;
        Color::from_rgba8(r, g, b, a)
    }
}

/// Runtime state that exists once the window is up.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    line_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion.
    texture_blitter: vello::wgpu::util::TextureBlitter,
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    // Declared before `scene`: the lines and the legend release their
    // entries first.
    controller: Controller,
    help: Option<Registration>,
    scene: Rc<RefCell<Scene>>,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
}

impl App {
    /// Create a new application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let scene = Scene::new(config.demo.scene.extent()).into_shared();
        let surface: SharedSurface = scene.clone();
        let controller = Controller::demo(&surface, &config.demo);
        let help = config.show_help.then(|| {
            let extent = config.demo.scene.extent();
            let anchor = Point::new(extent.x1 - HELP_INSET.0, extent.y0 + HELP_INSET.1);
            Registration::label(&surface, Label::new(ShortcutRegistry::help_text(), anchor))
        });
        Self {
            config,
            controller,
            help,
            scene,
            state: None,
            render_cx: None,
        }
    }

    /// Run the application.
    pub async fn run() {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let mut app = App::with_config(AppConfig::from_env());
        ShortcutRegistry::print_all();
        event_loop.run_app(&mut app).expect("Event loop error");
    }

    /// The demo controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Handle of the controls legend, if it is shown.
    pub fn help_label(&self) -> Option<SurfaceHandle> {
        self.help.as_ref().map(Registration::handle)
    }

    /// Finish initialization after surface is created.
    fn finish_init(&mut self, window: Arc<Window>, surface: RenderSurface<'static>) -> RenderResult<()> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| RendererError::InitFailed("render context missing".to_string()))?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| RendererError::InitFailed(format!("vello renderer: {e:?}")))?;

        // Vello renders to Rgba8Unorm; the surface format may differ.
        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        self.state = Some(AppState {
            window,
            surface,
            vello_renderer,
            line_renderer: VelloRenderer::new(),
            texture_blitter,
        });
        log::info!("Renderer ready");
        Ok(())
    }

    /// Apply a pressed key and repaint if anything changed.
    fn handle_key(&mut self, key: &winit::keyboard::Key) {
        let Some(command) = command_for_key(key) else {
            return;
        };
        self.controller.handle(command);

        if self.scene.borrow_mut().take_redraw() {
            if let Some(state) = &self.state {
                state.window.request_redraw();
            }
        }
    }

    /// Build and present one frame.
    fn render(&mut self) -> RenderResult<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        let Some(render_cx) = self.render_cx.as_ref() else {
            return Ok(());
        };

        let (scene, base_color) = {
            let mut scene = self.scene.borrow_mut();
            scene.take_redraw();
            let ctx = RenderContext::new(&scene)
                .with_scale_factor(state.window.scale_factor())
                .with_background(self.config.background_color());
            state.line_renderer.build_scene(&ctx);
            (state.line_renderer.take_scene(), state.line_renderer.background_color(&ctx))
        };

        let device_handle = &render_cx.devices[state.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = state
            .surface
            .surface
            .get_current_texture()
            .map_err(|e| RendererError::Surface(format!("{e:?}")))?;

        let width = state.surface.config.width;
        let height = state.surface.config.height;

        let params = RenderParams {
            base_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello's compute shaders need a storage-bindable Rgba8Unorm target.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        state
            .vello_renderer
            .render_to_texture(device, queue, &scene, &render_texture_view, &params)
            .map_err(|e| RendererError::RenderFailed(format!("{e:?}")))?;

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        let mut blit_encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
            label: Some("blit encoder"),
        });
        state
            .texture_blitter
            .copy(device, &mut blit_encoder, &render_texture_view, &surface_view);
        queue.submit(std::iter::once(blit_encoder.finish()));

        surface_texture.present();
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        log::info!("Creating window...");

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };

        log::info!("Surface size: {}x{}", width, height);

        let render_cx = self
            .render_cx
            .get_or_insert_with(vello::util::RenderContext::new);

        let surface = pollster::block_on(render_cx.create_surface(
            window.clone(),
            width,
            height,
            PresentMode::AutoVsync,
        ))
        .expect("Failed to create surface");

        if let Err(e) = self.finish_init(window, surface) {
            log::error!("{e}");
            event_loop.exit();
            return;
        }
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                let Some(state) = self.state.as_mut() else {
                    return;
                };
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(state) = &self.state {
                    state.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    log::warn!("Frame skipped: {e}");
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    self.handle_key(&event.logical_key);
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoline_core::{ActiveLine, Line, LineKind};
    use std::io::Write;
    use winit::keyboard::{Key, NamedKey};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (550, 550));
        assert_eq!(config.background, [255, 255, 255, 255]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_json(
            r#"{ "title": "Lines", "demo": { "controls": { "move_step": 20 } } }"#,
        )
        .unwrap();
        assert_eq!(config.title, "Lines");
        assert_eq!(config.width, 550);
        assert_eq!(config.demo.controls.move_step, 20);
    }

    #[test]
    fn test_invalid_config() {
        assert!(AppConfig::from_json(r#"{ "width": 0 }"#).is_err());
        assert!(AppConfig::from_json(r#"{ "demo": { "scene": { "height": -1.0 } } }"#).is_err());
    }

    #[test]
    fn test_load_or_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "height": 300 }}"#).unwrap();
        assert_eq!(AppConfig::load_or_default(file.path()).height, 300);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        assert_eq!(AppConfig::load_or_default(broken.path()), AppConfig::default());
    }

    #[test]
    fn test_help_drawn_in_scene() {
        let app = App::new();
        let handle = app.help_label().unwrap();
        let scene = app.scene.borrow();
        let label = scene.label(handle).unwrap();
        assert!(label.text.starts_with("Controls:"));
        assert!(label.parent.is_none());
        assert_eq!(label.position, Point::new(350.0, 10.0));

        let last = scene.items_ordered().last().map(|(h, _)| h);
        assert_eq!(last, Some(handle));
    }

    #[test]
    fn test_help_can_be_hidden() {
        let config = AppConfig::from_json(r#"{ "show_help": false }"#).unwrap();
        let with_help = App::new().scene.borrow().len();
        let app = App::with_config(config);
        assert!(app.help_label().is_none());
        assert_eq!(app.scene.borrow().len(), with_help - 1);
    }

    #[test]
    fn test_keys_drive_controller_without_window() {
        let mut app = App::new();
        app.handle_key(&Key::Character("s".into()));
        assert_eq!(
            app.controller().line(ActiveLine::First).endpoints().p0,
            Point::new(100.0, 200.0)
        );

        app.handle_key(&Key::Named(NamedKey::Space));
        assert_eq!(app.controller().active_line().kind(), LineKind::Raster);

        // The redraw flag was consumed by the key handler.
        assert!(!app.scene.borrow().is_redraw_requested());
    }
}
