//! Duoline Core Library
//!
//! Two interchangeable line primitives behind one capability trait: one that
//! hands its geometry to a host scene, and one that rasterizes itself with
//! Bresenham's algorithm.

pub mod config;
pub mod controller;
pub mod input;
pub mod line;
pub mod pose;
pub mod raster;
pub mod scene;
pub mod surface;

pub use config::{ConfigError, ControlConfig, DemoConfig, SceneConfig};
pub use controller::{ActiveLine, Controller};
pub use input::{BINDINGS, KeyBinding, LineCommand, command_for_key};
pub use line::{HostLine, Line, LineKind, LineVariant, RasterLine};
pub use pose::Pose;
pub use raster::{Clipped, LinePixels, Painter, Pixel, draw_line, rasterize};
pub use scene::Scene;
pub use surface::{Annotation, Label, LineItem, Primitive, RasterLayer, Registration, SharedSurface, Surface, SurfaceHandle};
