//! ecosense-eye: produce spoilage and hand gesture analysis
//!
//! Color-space segmentation, morphological cleanup and region analysis for
//! two pipelines: still produce images scored for decay, and live frames
//! reduced to a single hand posture for gesture control.

pub mod config;
pub mod engine;
pub mod error;
pub mod processing;

pub use config::{HsvRange, VisionConfig};
pub use engine::{AnalysisPipeline, GestureDetector, VisionEngine};
pub use error::VisionError;
pub use processing::{DetectionResult, Gesture, GestureSample, Point2, Region, SpoilageType};
