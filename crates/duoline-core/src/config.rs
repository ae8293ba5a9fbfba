//! Demo configuration.
//!
//! Everything has a default matching the stock two-line demo, so a config
//! file only needs the fields it wants to change.

use kurbo::{Line as KurboLine, Rect};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Largest absolute line coordinate a configuration may use.
pub const MAX_COORDINATE: f64 = 1.0e6;

/// Step sizes applied by keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Distance moved per move command.
    pub move_step: i32,
    /// Degrees turned per rotate command.
    pub rotation_step: f64,
    /// Length added or removed per grow/shrink command.
    pub resize_step: i32,
    /// Shortest length a resize may produce, for both line kinds.
    pub min_length: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_step: 100,
            rotation_step: 30.0,
            resize_step: 10,
            min_length: 0.0,
        }
    }
}

/// Size of the drawable scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 550.0,
            height: 550.0,
        }
    }
}

impl SceneConfig {
    /// The scene extent anchored at the origin.
    pub fn extent(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Full demo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub scene: SceneConfig,
    /// Initial segment of the host-rendered line as `[x1, y1, x2, y2]`.
    pub host_line: [f64; 4],
    /// Initial segment of the self-rendering line as `[x1, y1, x2, y2]`.
    pub raster_line: [f64; 4],
    pub controls: ControlConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            host_line: [100.0, 100.0, 200.0, 100.0],
            raster_line: [100.0, 200.0, 200.0, 200.0],
            controls: ControlConfig::default(),
        }
    }
}

fn segment([x1, y1, x2, y2]: [f64; 4]) -> KurboLine {
    KurboLine::new((x1, y1), (x2, y2))
}

impl DemoConfig {
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

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Initial segment of the host-rendered line.
    pub fn host_segment(&self) -> KurboLine {
        segment(self.host_line)
    }

    /// Initial segment of the self-rendering line.
    pub fn raster_segment(&self) -> KurboLine {
        segment(self.raster_line)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a positive number, got {value}"),
                })
            }
        };
        positive("scene.width", self.scene.width)?;
        positive("scene.height", self.scene.height)?;

        for (field, coords) in [("host_line", &self.host_line), ("raster_line", &self.raster_line)] {
            if coords.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "coordinates must be finite".to_string(),
                });
            }
            if coords.iter().any(|v| v.abs() > MAX_COORDINATE) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("coordinates must lie within ±{MAX_COORDINATE}"),
                });
            }
        }

        let controls = &self.controls;
        if !controls.rotation_step.is_finite() {
            return Err(ConfigError::Invalid {
                field: "controls.rotation_step",
                reason: "must be finite".to_string(),
            });
        }
        if controls.move_step < 0 {
            return Err(ConfigError::Invalid {
                field: "controls.move_step",
                reason: format!("must not be negative, got {}", controls.move_step),
            });
        }
        if controls.resize_step < 0 {
            return Err(ConfigError::Invalid {
                field: "controls.resize_step",
                reason: format!("must not be negative, got {}", controls.resize_step),
            });
        }
        if !controls.min_length.is_finite() || controls.min_length < 0.0 {
            return Err(ConfigError::Invalid {
                field: "controls.min_length",
                reason: format!("must be a non-negative number, got {}", controls.min_length),
            });
        }
        Ok(())
    }
}
