//! Hand posture classification from the dominant region

use crate::config::VisionConfig;
use crate::processing::shapes::{Point2, Region};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete hand postures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Fist,
    Open,
    Point,
    Unknown,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gesture::Fist => "fist",
            Gesture::Open => "open",
            Gesture::Point => "point",
            Gesture::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One detected hand in a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    /// Centroid in source-frame pixel coordinates
    pub position: Point2,
    pub gesture: Gesture,
}

/// Picks the hand among the extracted regions and maps its solidity to a gesture
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    min_hand_area: u64,
    fist_solidity: f64,
    open_solidity: f64,
}

impl GestureClassifier {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            min_hand_area: config.min_hand_area as u64,
            fist_solidity: config.fist_solidity,
            open_solidity: config.open_solidity,
        }
    }

    /// Map a solidity ratio onto a posture
    pub fn classify_solidity(&self, solidity: f64) -> Gesture {
        if solidity > self.fist_solidity {
            Gesture::Fist
        } else if solidity > self.open_solidity {
            Gesture::Open
        } else {
            Gesture::Point
        }
    }

    /// Classify the largest region, if it is large enough to be a hand.
    /// Among regions of equal area the first one in scan order wins.
    /// Regions need geometry (centroid and hull) to produce a sample.
    pub fn classify(&self, regions: &[Region]) -> Option<GestureSample> {
        let hand = regions
            .iter()
            .reduce(|best, region| if region.area > best.area { region } else { best })?;
        if hand.area <= self.min_hand_area {
            return None;
        }

        let position = hand.centroid?;
        let gesture = match hand.solidity() {
            Some(solidity) => self.classify_solidity(solidity),
            None => Gesture::Unknown,
        };

        Some(GestureSample { position, gesture })
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(&VisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::shapes::BoundingBox;

    fn hand(area: u64, hull_area: f64) -> Region {
        Region::new(BoundingBox { x: 0, y: 0, width: 100, height: 100 }, area)
            .with_geometry(hull_area, Point2::new(40.0, 60.0))
    }

    #[test]
    fn test_solidity_boundaries() {
        let classifier = GestureClassifier::default();
        assert_eq!(classifier.classify_solidity(0.95), Gesture::Fist);
        assert_eq!(classifier.classify_solidity(0.80001), Gesture::Fist);
        assert_eq!(classifier.classify_solidity(0.80), Gesture::Open);
        assert_eq!(classifier.classify_solidity(0.60001), Gesture::Open);
        assert_eq!(classifier.classify_solidity(0.60), Gesture::Point);
        assert_eq!(classifier.classify_solidity(0.1), Gesture::Point);
    }

    #[test]
    fn test_small_hand_ignored() {
        let classifier = GestureClassifier::default();
        assert!(classifier.classify(&[hand(5000, 5000.0)]).is_none());
        assert!(classifier.classify(&[hand(5001, 5001.0)]).is_some());
    }

    #[test]
    fn test_no_regions() {
        assert!(GestureClassifier::default().classify(&[]).is_none());
    }

    #[test]
    fn test_largest_region_wins() {
        let classifier = GestureClassifier::default();
        let small = Region::new(BoundingBox { x: 0, y: 0, width: 10, height: 10 }, 6000)
            .with_geometry(6000.0, Point2::new(1.0, 1.0));
        let large = hand(9000, 20000.0);
        let sample = classifier.classify(&[small, large]).unwrap();
        assert_eq!(sample.gesture, Gesture::Point);
        assert_eq!(sample.position, Point2::new(40.0, 60.0));
    }

    #[test]
    fn test_equal_areas_keep_first_region() {
        let classifier = GestureClassifier::default();
        let first = hand(8000, 8500.0);
        let second = Region::new(BoundingBox { x: 150, y: 0, width: 100, height: 100 }, 8000)
            .with_geometry(16000.0, Point2::new(190.0, 60.0));

        let sample = classifier.classify(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(sample.position, Point2::new(40.0, 60.0));
        assert_eq!(sample.gesture, Gesture::Fist);

        let sample = classifier.classify(&[second, first]).unwrap();
        assert_eq!(sample.position, Point2::new(190.0, 60.0));
        assert_eq!(sample.gesture, Gesture::Point);
    }

    #[test]
    fn test_missing_centroid_yields_none() {
        let region = Region::new(BoundingBox { x: 0, y: 0, width: 100, height: 100 }, 8000);
        assert!(GestureClassifier::default().classify(&[region]).is_none());
    }

    #[test]
    fn test_missing_hull_is_unknown() {
        let mut region = hand(8000, 8000.0);
        region.hull_area = None;
        let sample = GestureClassifier::default().classify(&[region]).unwrap();
        assert_eq!(sample.gesture, Gesture::Unknown);
    }

    #[test]
    fn test_gesture_display() {
        assert_eq!(Gesture::Fist.to_string(), "fist");
        assert_eq!(Gesture::Unknown.to_string(), "unknown");
    }
}
