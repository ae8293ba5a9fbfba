//! Duoline Render Library
//!
//! Renderer abstraction for the Duoline scene.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError, label_transform, pixel_rect};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
