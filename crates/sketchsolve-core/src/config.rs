//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use crate::document::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default endpoint of the recognition service.
pub const DEFAULT_SOLVER_URL: &str = "ws://127.0.0.1:8000/ws/";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: ViewportConfig,
    pub eraser: EraserConfig,
    pub idle: IdleConfig,
    pub extract: ExtractConfig,
    pub index: IndexConfig,
    pub style: RenderStyle,
    /// Websocket URL of the recognition service.
    pub solver_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            eraser: EraserConfig::default(),
            idle: IdleConfig::default(),
            extract: ExtractConfig::default(),
            index: IndexConfig::default(),
            style: RenderStyle::default(),
            solver_url: DEFAULT_SOLVER_URL.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Pan/zoom limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Divisor applied to wheel deltas.
    pub zoom_sensitivity: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 3.0,
            zoom_sensitivity: 500.0,
        }
    }
}

/// Eraser tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EraserConfig {
    /// Eraser radius before the toolbar picks a size.
    pub default_size: f64,
    /// Factor applied to sizes coming from the toolbar.
    pub size_scale: f64,
    /// Fraction of the radius within which an endpoint counts as hit.
    pub endpoint_ratio: f64,
    /// Fraction of the radius within which the perpendicular projection counts as hit.
    pub projection_ratio: f64,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            default_size: 20.0,
            size_scale: 1.1,
            endpoint_ratio: 0.5,
            projection_ratio: 0.5,
        }
    }
}

/// Idle detection timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub timeout_ms: u64,
    pub throttle_ms: u64,
}

impl IdleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3_000,
            throttle_ms: 500,
        }
    }
}

/// Padding applied around an extracted region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Pulled off the min corner (then clamped at zero).
    pub corner_inset: f64,
    /// Added to the raw width and height.
    pub span_pad: f64,
    /// Stroke width used in the extracted image.
    pub line_width: f64,
    pub background: SerializableColor,
    pub ink: SerializableColor,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            corner_inset: 20.0,
            span_pad: 50.0,
            line_width: 3.0,
            background: SerializableColor::white(),
            ink: SerializableColor::black(),
        }
    }
}

/// Spatial index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub capacity: usize,
    /// Initial root region edge length, centered on the document origin.
    pub initial_extent: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            capacity: crate::quadtree::DEFAULT_CAPACITY,
            initial_extent: 4096.0,
        }
    }
}

/// Colors and widths used by the redraw pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub background: SerializableColor,
    pub grid_color: SerializableColor,
    /// Grid spacing in document units.
    pub grid_spacing: f64,
    pub line_color: SerializableColor,
    pub line_width: f64,
    pub text_color: SerializableColor,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: SerializableColor::new(0xf5, 0xf5, 0xf5, 255),
            grid_color: SerializableColor::new(0xe0, 0xe0, 0xe0, 255),
            grid_spacing: 20.0,
            line_color: SerializableColor::black(),
            line_width: 3.0,
            text_color: SerializableColor::black(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.idle.timeout(), Duration::from_millis(3000));
        assert_eq!(config.idle.throttle(), Duration::from_millis(500));
        assert!((config.extract.corner_inset - 20.0).abs() < f64::EPSILON);
        assert!((config.extract.span_pad - 50.0).abs() < f64::EPSILON);
        assert!((config.eraser.projection_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.solver_url, DEFAULT_SOLVER_URL);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"idle": {"timeout_ms": 1500}, "eraser": {"projection_ratio": 0.3333}}"#).unwrap();
        assert_eq!(config.idle.timeout_ms, 1500);
        assert_eq!(config.idle.throttle_ms, 500);
        assert!((config.eraser.projection_ratio - 0.3333).abs() < f64::EPSILON);
        assert!((config.eraser.endpoint_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(EngineConfig::from_json("{not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"solver_url": "ws://example.test/ws/"}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.solver_url, "ws://example.test/ws/");
        assert_eq!(config.style, RenderStyle::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
