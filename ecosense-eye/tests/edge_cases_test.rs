//! Edge case tests for ecosense-eye

use ecosense_eye::processing::{Mask, MaskCleaner, Region, RegionDetail, ShapeExtractor, SpoilageClassifier};
use ecosense_eye::{GestureDetector, SpoilageType, VisionConfig, VisionEngine, VisionError};
use image::{Rgb, RgbImage};
use std::io::Write;

#[test]
fn test_config_edge_cases() {
    // Smallest valid kernels
    let mut config = VisionConfig::default();
    config.morph_kernel_size = 1;
    config.blur_kernel_size = 1;
    assert!(config.validate().is_ok());

    // Largest valid kernels
    config.morph_kernel_size = 99;
    config.blur_kernel_size = 99;
    assert!(config.validate().is_ok());

    config.severity_saturation_area = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
noise_floor_area = 50
clean_gesture_mask = false

[spoilage_range]
lower = [8, 40, 20]
upper = [22, 255, 210]
"#
    )
    .unwrap();

    let config = VisionConfig::load(file.path()).unwrap();
    assert_eq!(config.noise_floor_area, 50);
    assert!(!config.clean_gesture_mask);
    assert_eq!(config.spoilage_range.lower, [8, 40, 20]);
    assert_eq!(config.morph_kernel_size, 5);
}

#[test]
fn test_config_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = VisionConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, VisionError::Io(_)));
}

#[test]
fn test_config_load_rejects_bad_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "fist_solidity = 0.5\nopen_solidity = 0.7").unwrap();
    let err = VisionConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, VisionError::Config(_)));
}

#[test]
fn test_single_pixel_image() {
    let engine = VisionEngine::ready(VisionConfig::default()).unwrap();
    let image = RgbImage::from_pixel(1, 1, Rgb([139, 90, 43]));
    let result = engine.detect_spoilage(&image).unwrap();
    // One pixel can never clear the noise floor
    assert_eq!(result.kind, SpoilageType::Fresh);
    assert!(result.areas.is_empty());
}

#[test]
fn test_uniform_frame_sample_stays_in_frame() {
    let engine = VisionEngine::ready(VisionConfig::default()).unwrap();
    let frame = RgbImage::from_pixel(160, 120, Rgb([128, 128, 128]));
    // A flat frame has no contrast to split on; any sample must stay in frame
    if let Some(sample) = engine.detect_gesture(&frame).unwrap() {
        assert!(sample.position.x >= 0.0 && sample.position.x < 160.0);
        assert!(sample.position.y >= 0.0 && sample.position.y < 120.0);
    }
}

#[test]
fn test_gesture_on_zero_area_frame() {
    let engine = VisionEngine::ready(VisionConfig::default()).unwrap();
    let err = engine.detect_gesture(&RgbImage::new(0, 0)).unwrap_err();
    assert!(matches!(err, VisionError::UnsupportedImage(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_empty_mask_has_no_regions() {
    let mask = Mask::new(32, 32);
    assert!(ShapeExtractor::new().extract_regions(&mask, RegionDetail::Geometry).is_empty());
    assert!(MaskCleaner::new(5).clean(&mask).is_empty());
}

#[test]
fn test_full_mask_is_one_region() {
    let mask = Mask::from_fn(30, 20, |_, _| true);
    let cleaned = MaskCleaner::new(5).clean(&mask);
    assert_eq!(cleaned.count_on(), 600);

    let regions = ShapeExtractor::new().extract_regions(&cleaned, RegionDetail::Geometry);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].area, 600);
    assert_eq!(regions[0].solidity(), Some(1.0));
}

#[test]
fn test_classifier_zero_total_area() {
    let classifier = SpoilageClassifier::default();
    let regions = vec![Region::new(
        ecosense_eye::processing::BoundingBox {
            x: 0,
            y: 0,
            width: 20,
            height: 20,
        },
        400,
    )];
    let result = classifier.classify(&regions, 0);
    assert_eq!(result.spoilage_level, 0.0);
    assert_eq!(result.kind, SpoilageType::Fresh);
}

#[test]
fn test_result_serializes_with_wire_names() {
    let engine = VisionEngine::ready(VisionConfig::default()).unwrap();
    let image = RgbImage::from_fn(50, 50, |x, y| {
        if x < 20 && y < 20 {
            Rgb([139, 90, 43])
        } else {
            Rgb([34, 139, 34])
        }
    });
    let result = engine.detect_spoilage(&image).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("spoilageLevel").is_some());
    assert_eq!(json["type"], "moderate");
    assert!(json["areas"][0].get("severity").is_some());
}
