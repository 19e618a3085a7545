//! Spoilage scoring from decay regions

use crate::config::VisionConfig;
use crate::processing::shapes::Region;
use serde::{Deserialize, Serialize};
use std::fmt;

const MIN_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 1.0;

/// Overall produce condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpoilageType {
    Fresh,
    Moderate,
    Spoiled,
}

impl SpoilageType {
    /// Category for a spoilage percentage: [0, 5) fresh, [5, 20) moderate, 20+ spoiled
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 5.0 {
            SpoilageType::Fresh
        } else if percentage < 20.0 {
            SpoilageType::Moderate
        } else {
            SpoilageType::Spoiled
        }
    }

    pub fn recommended_action(&self) -> &'static str {
        match self {
            SpoilageType::Fresh => "Safe to consume",
            SpoilageType::Moderate => "Use soon or process",
            SpoilageType::Spoiled => "Discard or compost",
        }
    }
}

impl fmt::Display for SpoilageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpoilageType::Fresh => "fresh",
            SpoilageType::Moderate => "moderate",
            SpoilageType::Spoiled => "spoiled",
        };
        f.write_str(name)
    }
}

/// A decay area that passed the noise floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoiledArea {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Normalized area score in [0, 1]
    pub severity: f64,
}

/// Outcome of one still-image analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Percentage of the image covered by decay regions
    pub spoilage_level: f64,
    pub confidence: f64,
    #[serde(rename = "type")]
    pub kind: SpoilageType,
    pub areas: Vec<SpoiledArea>,
}

impl DetectionResult {
    /// Result for an image with no decay regions at all
    pub fn fresh() -> Self {
        let (kind, confidence) = categorize(0.0);
        Self {
            spoilage_level: 0.0,
            confidence,
            kind,
            areas: Vec::new(),
        }
    }
}

/// Category and clamped confidence for a spoilage percentage
pub fn categorize(percentage: f64) -> (SpoilageType, f64) {
    let p = if percentage.is_finite() { percentage } else { 0.0 };
    let kind = SpoilageType::from_percentage(p);
    let confidence = match kind {
        SpoilageType::Fresh => 0.9 - p / 10.0,
        SpoilageType::Moderate => 0.8 - p / 50.0,
        SpoilageType::Spoiled => 0.7 + (p / 100.0).min(0.2),
    };
    (kind, confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
}

/// Pure scoring of decay regions against the image area
#[derive(Debug, Clone)]
pub struct SpoilageClassifier {
    noise_floor_area: u64,
    severity_saturation_area: f64,
}

impl SpoilageClassifier {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            noise_floor_area: config.noise_floor_area as u64,
            severity_saturation_area: config.severity_saturation_area,
        }
    }

    /// Saturating severity score for a region area
    pub fn severity(&self, area: u64) -> f64 {
        (area as f64 / self.severity_saturation_area).min(1.0)
    }

    pub fn classify(&self, regions: &[Region], total_pixel_area: u64) -> DetectionResult {
        let surviving: Vec<&Region> = regions
            .iter()
            .filter(|r| r.area > self.noise_floor_area)
            .collect();

        let spoiled_pixels: u64 = surviving.iter().map(|r| r.area).sum();
        let spoilage_level = if total_pixel_area == 0 {
            0.0
        } else {
            100.0 * spoiled_pixels as f64 / total_pixel_area as f64
        };

        let areas = surviving
            .iter()
            .map(|r| SpoiledArea {
                x: r.bounding_box.x,
                y: r.bounding_box.y,
                width: r.bounding_box.width,
                height: r.bounding_box.height,
                severity: self.severity(r.area),
            })
            .collect();

        let (kind, confidence) = categorize(spoilage_level);
        DetectionResult {
            spoilage_level,
            confidence,
            kind,
            areas,
        }
    }
}

impl Default for SpoilageClassifier {
    fn default() -> Self {
        Self::new(&VisionConfig::default())
    }
}
