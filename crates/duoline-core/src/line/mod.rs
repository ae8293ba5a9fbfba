//! Line primitives.

mod host;
mod raster;

pub use host::HostLine;
pub use raster::RasterLine;

use kurbo::Line as KurboLine;
use serde::{Deserialize, Serialize};

/// Which backend a line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// Rendered and transformed by the host scene.
    Host,
    /// Rasterized by the line itself.
    Raster,
}

impl LineKind {
    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            LineKind::Host => "host",
            LineKind::Raster => "raster",
        }
    }
}

/// Operations every line supports.
///
/// All operations are total: they never fail for finite input, and each one
/// leaves the line ready to be drawn again.
pub trait Line {
    /// Translate the line; length and rotation are unchanged.
    fn move_by(&mut self, dx: i32, dy: i32);

    /// Turn clockwise by the configured step around the first endpoint.
    fn rotate_clockwise(&mut self);

    /// Turn counter-clockwise by the configured step around the first endpoint.
    fn rotate_counter_clockwise(&mut self);

    /// Change the length by `delta`, keeping the first endpoint fixed.
    fn resize(&mut self, delta: i32);

    /// The backend in use.
    fn kind(&self) -> LineKind;

    /// Current segment in scene coordinates.
    fn endpoints(&self) -> KurboLine;

    /// Current rotation in degrees.
    fn rotation(&self) -> f64;

    /// Current length.
    fn length(&self) -> f64;
}

/// Either kind of line, fixed at construction.
#[derive(Debug)]
pub enum LineVariant {
    Host(HostLine),
    Raster(RasterLine),
}

impl LineVariant {
    pub fn as_host(&self) -> Option<&HostLine> {
        match self {
            LineVariant::Host(line) => Some(line),
            LineVariant::Raster(_) => None,
        }
    }

    pub fn as_raster(&self) -> Option<&RasterLine> {
        match self {
            LineVariant::Raster(line) => Some(line),
            LineVariant::Host(_) => None,
        }
    }
}

impl From<HostLine> for LineVariant {
    fn from(line: HostLine) -> Self {
        LineVariant::Host(line)
    }
}

impl From<RasterLine> for LineVariant {
    fn from(line: RasterLine) -> Self {
        LineVariant::Raster(line)
    }
}

impl Line for LineVariant {
    fn move_by(&mut self, dx: i32, dy: i32) {
        match self {
            LineVariant::Host(l) => l.move_by(dx, dy),
            LineVariant::Raster(l) => l.move_by(dx, dy),
        }
    }

    fn rotate_clockwise(&mut self) {
        match self {
            LineVariant::Host(l) => l.rotate_clockwise(),
            LineVariant::Raster(l) => l.rotate_clockwise(),
        }
    }

    fn rotate_counter_clockwise(&mut self) {
        match self {
            LineVariant::Host(l) => l.rotate_counter_clockwise(),
            LineVariant::Raster(l) => l.rotate_counter_clockwise(),
        }
    }

    fn resize(&mut self, delta: i32) {
        match self {
            LineVariant::Host(l) => l.resize(delta),
            LineVariant::Raster(l) => l.resize(delta),
        }
    }

    fn kind(&self) -> LineKind {
        match self {
            LineVariant::Host(l) => l.kind(),
            LineVariant::Raster(l) => l.kind(),
        }
    }

    fn endpoints(&self) -> KurboLine {
        match self {
            LineVariant::Host(l) => l.endpoints(),
            LineVariant::Raster(l) => l.endpoints(),
        }
    }

    fn rotation(&self) -> f64 {
        match self {
            LineVariant::Host(l) => l.rotation(),
            LineVariant::Raster(l) => l.rotation(),
        }
    }

    fn length(&self) -> f64 {
        match self {
            LineVariant::Host(l) => l.length(),
            LineVariant::Raster(l) => l.length(),
        }
    }
}
