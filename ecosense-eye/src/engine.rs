//! Vision engine facade used by the UI layer and the gesture control loop

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::processing::{
    DetectionResult, GestureClassifier, GestureSample, ImageSegmenter, MaskCleaner, RegionDetail,
    SegmentationMode, ShapeExtractor, SpoilageClassifier,
};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Anything that can turn a video frame into at most one gesture sample
pub trait GestureDetector: Send + Sync {
    /// Whether `detect_gesture` can be called yet
    fn is_ready(&self) -> bool;

    fn detect_gesture(&self, frame: &RgbImage) -> Result<Option<GestureSample>, VisionError>;
}

/// Every stage of both pipelines, built once on initialization
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    segmenter: ImageSegmenter,
    cleaner: MaskCleaner,
    extractor: ShapeExtractor,
    spoilage: SpoilageClassifier,
    gesture: GestureClassifier,
    clean_gesture_mask: bool,
}

impl AnalysisPipeline {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            segmenter: ImageSegmenter::new(config),
            cleaner: MaskCleaner::new(config.morph_kernel_size),
            extractor: ShapeExtractor::new(),
            spoilage: SpoilageClassifier::new(config),
            gesture: GestureClassifier::new(config),
            clean_gesture_mask: config.clean_gesture_mask,
        }
    }

    /// Still-image decay analysis
    pub fn analyze_produce(&self, image: &RgbImage) -> Result<DetectionResult, VisionError> {
        let mask = self.segmenter.segment(image, SegmentationMode::Spoilage)?;
        let mask = self.cleaner.clean(&mask);
        let regions = self.extractor.extract_regions(&mask, RegionDetail::Basic);
        let total = image.width() as u64 * image.height() as u64;
        Ok(self.spoilage.classify(&regions, total))
    }

    /// Dominant hand posture in a frame
    pub fn analyze_hand(&self, frame: &RgbImage) -> Result<Option<GestureSample>, VisionError> {
        let mut mask = self.segmenter.segment(frame, SegmentationMode::Gesture)?;
        if self.clean_gesture_mask {
            mask = self.cleaner.clean(&mask);
        }
        let regions = self.extractor.extract_regions(&mask, RegionDetail::Geometry);
        Ok(self.gesture.classify(&regions))
    }
}

/// Decrements the in-flight counter on every exit path
struct ProcessingGuard<'a>(&'a AtomicUsize);

impl<'a> ProcessingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Entry point for spoilage detection and gesture sampling
pub struct VisionEngine {
    config: Arc<VisionConfig>,
    pipeline: RwLock<Option<Arc<AnalysisPipeline>>>,
    in_flight: AtomicUsize,
}

impl VisionEngine {
    /// Create an engine; it is not ready until `initialize` succeeds
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            pipeline: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
        })
    }

    /// Create and initialize in one step
    pub fn ready(config: VisionConfig) -> Result<Self, VisionError> {
        let engine = Self::new(config)?;
        engine.initialize();
        Ok(engine)
    }

    /// Build the analysis pipeline. Calling it again is a no-op.
    pub fn initialize(&self) {
        let mut pipeline = self.pipeline.write();
        if pipeline.is_some() {
            return;
        }
        *pipeline = Some(Arc::new(AnalysisPipeline::new(&self.config)));
        info!(
            "Vision engine ready (morph kernel {}, blur kernel {})",
            self.config.morph_kernel_size, self.config.blur_kernel_size
        );
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.read().is_some()
    }

    /// Whether an analysis call is currently running
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn pipeline(&self) -> Result<Arc<AnalysisPipeline>, VisionError> {
        self.pipeline.read().clone().ok_or(VisionError::EngineNotReady)
    }

    /// Estimate decay on a decoded produce image
    pub fn detect_spoilage(&self, image: &RgbImage) -> Result<DetectionResult, VisionError> {
        let pipeline = self.pipeline()?;
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let result = pipeline.analyze_produce(image)?;
        info!(
            "Spoilage analysis: {:.2}% {} ({} areas, confidence {:.2})",
            result.spoilage_level,
            result.kind,
            result.areas.len(),
            result.confidence
        );
        Ok(result)
    }

    /// Copy of `image` with every detected area outlined
    pub fn annotate(&self, image: &RgbImage, result: &DetectionResult) -> RgbImage {
        let mut canvas = image.clone();
        for area in &result.areas {
            if area.width == 0 || area.height == 0 {
                continue;
            }
            let outer = Rect::at(area.x as i32, area.y as i32).of_size(area.width, area.height);
            draw_hollow_rect_mut(&mut canvas, outer, OVERLAY_COLOR);
            if area.width > 2 && area.height > 2 {
                let inner = Rect::at(area.x as i32 + 1, area.y as i32 + 1).of_size(area.width - 2, area.height - 2);
                draw_hollow_rect_mut(&mut canvas, inner, OVERLAY_COLOR);
            }
        }
        canvas
    }
}

impl GestureDetector for VisionEngine {
    fn is_ready(&self) -> bool {
        VisionEngine::is_ready(self)
    }

    fn detect_gesture(&self, frame: &RgbImage) -> Result<Option<GestureSample>, VisionError> {
        let pipeline = self.pipeline()?;
        let _guard = ProcessingGuard::enter(&self.in_flight);

        let sample = pipeline.analyze_hand(frame)?;
        if let Some(sample) = &sample {
            debug!(
                "Gesture {} at ({:.1}, {:.1})",
                sample.gesture, sample.position.x, sample.position.y
            );
        }
        Ok(sample)
    }
}
