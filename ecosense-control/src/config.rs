//! Configuration for the gesture control loop

use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Control loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Resolution hint (width, height) passed to the video source
    pub resolution: (u32, u32),
    /// Sampling rate in frames per second
    pub frame_rate: u32,
    /// Scroll delta per pixel of vertical offset from the viewport center
    pub scroll_factor: f64,
    /// How long `stop()` waits for the sampling task before aborting it
    pub stop_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            resolution: (640, 480),
            frame_rate: 30,
            scroll_factor: 0.1,
            stop_timeout_ms: 1000,
        }
    }
}

impl ControlConfig {
    /// Parse and validate a TOML document; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ControlError> {
        let config: ControlConfig =
            toml::from_str(source).map_err(|e| ControlError::Config(format!("Invalid control config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ControlError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ControlError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err(ControlError::Config("Frame rate must be between 1 and 120".to_string()));
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ControlError::Config("Resolution must be greater than 0".to_string()));
        }
        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err(ControlError::Config("Resolution too large (max 7680x4320)".to_string()));
        }

        if !self.scroll_factor.is_finite() {
            return Err(ControlError::Config("Scroll factor must be finite".to_string()));
        }

        if self.stop_timeout_ms == 0 {
            return Err(ControlError::Config("Stop timeout must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Time between sampling ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    /// Bound on how long `stop()` waits for the sampling task
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
