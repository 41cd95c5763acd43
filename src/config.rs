//! Viewer configuration.
//! Defaults, optionally overridden from a JSON file and then from the command line.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Seconds between file checks.
    pub poll_interval_secs: f64,
    /// Side length of the background grids, in scene units.
    pub grid_size: f64,
    pub grid_divisions: usize,
    /// Only the first N spheres get an index label.
    pub label_limit: usize,
    /// Spheres never shrink below this on screen.
    pub min_sphere_pixels: f32,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5.0,
            grid_size: 1.1,
            grid_divisions: 10,
            label_limit: 99,
            min_sphere_pixels: 1.5,
            window_width: 1280.0,
            window_height: 800.0,
        }
    }
}

impl ViewerConfig {
    /// Load overrides from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.poll_interval_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                reason: format!("must be positive, got {}", self.poll_interval_secs),
            });
        }
        if !(self.grid_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "grid_size",
                reason: format!("must be positive, got {}", self.grid_size),
            });
        }
        if self.grid_divisions == 0 {
            return Err(ConfigError::Invalid {
                field: "grid_divisions",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }
}
