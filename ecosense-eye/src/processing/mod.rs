//! Vision processing pipelines

pub mod gesture;
pub mod mask;
pub mod morphology;
pub mod segmentation;
pub mod shapes;
pub mod spoilage;

pub use gesture::{Gesture, GestureClassifier, GestureSample};
pub use mask::Mask;
pub use morphology::{MaskCleaner, StructuringElement};
pub use segmentation::{ImageSegmenter, SegmentationMode};
pub use shapes::{BoundingBox, Point2, Region, RegionDetail, ShapeExtractor};
pub use spoilage::{DetectionResult, SpoilageClassifier, SpoilageType, SpoiledArea};
