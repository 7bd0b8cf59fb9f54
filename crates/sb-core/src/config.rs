//! Builder configuration structures
//!
//! Settings that shape how raw input is turned into control points and how
//! tools report what happens. Serialized as RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Point3;
use crate::constants::{DEFAULT_GRID_SPACING, DEFAULT_LOG_FILTER};

/// Grid snapping of raw input points
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapConfig {
    /// Whether raw points are snapped before constraints run
    pub enabled: bool,
    /// Grid spacing for snapping
    pub spacing: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spacing: DEFAULT_GRID_SPACING,
        }
    }
}

impl SnapConfig {
    /// Snapping enabled with the given spacing
    pub fn grid(spacing: f32) -> Self {
        Self {
            enabled: true,
            spacing,
        }
    }

    /// Snap a point to the grid if enabled
    pub fn snap_point(&self, point: Point3) -> Point3 {
        if self.enabled && self.spacing > 0.0 {
            (point / self.spacing).round() * self.spacing
        } else {
            point
        }
    }
}

/// Logging configuration for binaries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default tracing filter, used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Complete builder configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BuilderConfig {
    /// Snap settings
    #[serde(default)]
    pub snap: SnapConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BuilderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Serialize the configuration to RON text
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
