//! Configuration for ecosense-eye

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive HSV bounds in the 8-bit convention (H on 0..=180, S and V on 0..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    /// Brown/dark discoloration typical of decaying produce
    pub const DECAY: HsvRange = HsvRange {
        lower: [10, 50, 20],
        upper: [20, 255, 200],
    };

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Self::DECAY
    }
}

/// Vision engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Color range marking suspect pixels in produce images
    pub spoilage_range: HsvRange,
    /// Side of the elliptical structuring element used to clean masks
    pub morph_kernel_size: u32,
    /// Side of the Gaussian kernel applied to frames before thresholding
    pub blur_kernel_size: u32,
    /// Spoilage regions at or below this pixel area are noise
    pub noise_floor_area: u32,
    /// Region area at which severity saturates to 1.0
    pub severity_saturation_area: f64,
    /// The largest hand region must be strictly larger than this
    pub min_hand_area: u32,
    /// Solidity above this is a fist
    pub fist_solidity: f64,
    /// Solidity above this (and not a fist) is an open hand, otherwise pointing
    pub open_solidity: f64,
    /// Run the morphological cleaner on hand masks as well
    pub clean_gesture_mask: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            spoilage_range: HsvRange::DECAY,
            morph_kernel_size: 5,
            blur_kernel_size: 35,
            noise_floor_area: 100,
            severity_saturation_area: 1000.0,
            min_hand_area: 5000,
            fist_solidity: 0.8,
            open_solidity: 0.6,
            clean_gesture_mask: true,
        }
    }
}

impl VisionConfig {
    /// Parse a (possibly partial) TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, VisionError> {
        let config: VisionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), VisionError> {
        let range = &self.spoilage_range;
        if range.lower[0] > 180 || range.upper[0] > 180 {
            return Err(VisionError::Config("Hue bounds must be within 0..=180".to_string()));
        }
        if (0..3).any(|c| range.lower[c] > range.upper[c]) {
            return Err(VisionError::Config("Lower HSV bound exceeds upper bound".to_string()));
        }

        for (name, size) in [
            ("morph_kernel_size", self.morph_kernel_size),
            ("blur_kernel_size", self.blur_kernel_size),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(VisionError::Config(format!("{} must be a positive odd number", name)));
            }
            if size > 99 {
                return Err(VisionError::Config(format!("{} too large (max 99)", name)));
            }
        }

        if !self.severity_saturation_area.is_finite() || self.severity_saturation_area <= 0.0 {
            return Err(VisionError::Config("Severity saturation area must be positive".to_string()));
        }

        if !(self.open_solidity.is_finite() && self.fist_solidity.is_finite()) {
            return Err(VisionError::Config("Solidity thresholds must be finite".to_string()));
        }
        if self.open_solidity < 0.0 || self.fist_solidity > 1.0 || self.open_solidity >= self.fist_solidity {
            return Err(VisionError::Config(
                "Solidity thresholds must satisfy 0 <= open < fist <= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Gaussian sigma for the configured blur kernel, using the usual
    /// derivation from kernel size when no explicit sigma is given
    pub fn blur_sigma(&self) -> f32 {
        let k = self.blur_kernel_size as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}
