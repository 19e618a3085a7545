//! Color-space segmentation of produce images and hand frames

use crate::config::{HsvRange, VisionConfig};
use crate::error::VisionError;
use crate::processing::mask::Mask;
use image::{Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

/// Which kind of foreground the segmenter should isolate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Brown/dark decay spots on produce
    Spoilage,
    /// Dark hand silhouette against a brighter background
    Gesture,
}

/// Produces binary masks of candidate pixels
#[derive(Debug, Clone)]
pub struct ImageSegmenter {
    spoilage_range: HsvRange,
    blur_sigma: f32,
}

impl ImageSegmenter {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            spoilage_range: config.spoilage_range,
            blur_sigma: config.blur_sigma(),
        }
    }

    /// Segment an image; the mask always has the image's dimensions
    pub fn segment(&self, image: &RgbImage, mode: SegmentationMode) -> Result<Mask, VisionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::UnsupportedImage(format!(
                "Image has zero area ({}x{})",
                width, height
            )));
        }

        let mask = match mode {
            SegmentationMode::Spoilage => self.decay_mask(image),
            SegmentationMode::Gesture => self.hand_mask(image),
        };
        debug!("{:?} segmentation marked {} of {} pixels", mode, mask.count_on(), width as u64 * height as u64);
        Ok(mask)
    }

    fn decay_mask(&self, image: &RgbImage) -> Mask {
        let range = self.spoilage_range;
        Mask::from_fn(image.width(), image.height(), |x, y| {
            range.contains(rgb_to_hsv(*image.get_pixel(x, y)))
        })
    }

    fn hand_mask(&self, image: &RgbImage) -> Mask {
        let gray = image::imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, self.blur_sigma);
        let level = otsu_level(&blurred);
        debug!("Otsu level {}", level);

        // Inverted binary threshold: the darker side of the split is foreground
        Mask::from_fn(blurred.width(), blurred.height(), |x, y| blurred.get_pixel(x, y)[0] <= level)
    }
}

/// RGB to HSV with H halved onto 0..=180 and S, V on 0..=255
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round() as u8, s.round() as u8, v as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWN: Rgb<u8> = Rgb([139, 90, 43]);
    const GREEN: Rgb<u8> = Rgb([34, 139, 34]);

    fn segmenter() -> ImageSegmenter {
        ImageSegmenter::new(&VisionConfig::default())
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 0])), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(Rgb([128, 128, 128])), [0, 0, 128]);
    }

    #[test]
    fn test_rgb_to_hsv_brown() {
        assert_eq!(rgb_to_hsv(BROWN), [15, 176, 139]);
    }

    #[test]
    fn test_zero_area_image_rejected() {
        let image = RgbImage::new(0, 10);
        let err = segmenter().segment(&image, SegmentationMode::Spoilage).unwrap_err();
        assert!(matches!(err, VisionError::UnsupportedImage(_)));

        let image = RgbImage::new(10, 0);
        assert!(segmenter().segment(&image, SegmentationMode::Gesture).is_err());
    }

    #[test]
    fn test_spoilage_mask_marks_brown_only() {
        let image = RgbImage::from_fn(20, 10, |x, _| if x < 10 { BROWN } else { GREEN });
        let mask = segmenter().segment(&image, SegmentationMode::Spoilage).unwrap();
        assert_eq!(mask.dimensions(), (20, 10));
        assert_eq!(mask.count_on(), 100);
        assert!(mask.get(0, 0));
        assert!(!mask.get(15, 5));
    }

    #[test]
    fn test_spoilage_mask_ignores_black() {
        let image = RgbImage::new(100, 100);
        let mask = segmenter().segment(&image, SegmentationMode::Spoilage).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_gesture_mask_isolates_dark_square() {
        let image = RgbImage::from_fn(120, 120, |x, y| {
            if (30..90).contains(&x) && (30..90).contains(&y) {
                Rgb([20, 20, 20])
            } else {
                Rgb([235, 235, 235])
            }
        });
        let mask = segmenter().segment(&image, SegmentationMode::Gesture).unwrap();
        assert_eq!(mask.dimensions(), (120, 120));
        assert!(mask.get(60, 60));
        assert!(!mask.get(2, 2));
        assert!(!mask.get(117, 117));
    }
}
