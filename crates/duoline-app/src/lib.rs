//! Duoline Application
//!
//! Window, GPU surface and keyboard handling around the two-line demo.

mod app;
mod shortcuts;

pub use app::{App, AppConfig, CONFIG_ENV};
pub use shortcuts::ShortcutRegistry;
