//! External region extraction from binary masks

use crate::processing::mask::Mask;
use image::{GrayImage, Luma};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How much geometry to compute per region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionDetail {
    /// Area and bounding box only
    Basic,
    /// Also convex hull area and centroid
    Geometry,
}

/// A connected foreground region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub bounding_box: BoundingBox,
    /// Pixel count of the region with its holes filled
    pub area: u64,
    pub hull_area: Option<f64>,
    pub centroid: Option<Point2>,
}

impl Region {
    /// Region with area and bounding box only
    pub fn new(bounding_box: BoundingBox, area: u64) -> Self {
        Self {
            bounding_box,
            area,
            hull_area: None,
            centroid: None,
        }
    }

    pub fn with_geometry(mut self, hull_area: f64, centroid: Point2) -> Self {
        self.hull_area = Some(hull_area);
        self.centroid = Some(centroid);
        self
    }

    /// Area over convex hull area, in [0, 1]
    pub fn solidity(&self) -> Option<f64> {
        match self.hull_area {
            Some(hull) if hull > 0.0 && hull.is_finite() => Some((self.area as f64 / hull).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u64,
    sum_x: f64,
    sum_y: f64,
    corners: Vec<Point<i32>>,
}

impl Accumulator {
    fn start(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            ..Default::default()
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
    }

    fn into_region(mut self, detail: RegionDetail) -> Region {
        let region = Region::new(
            BoundingBox {
                x: self.min_x,
                y: self.min_y,
                width: self.max_x - self.min_x + 1,
                height: self.max_y - self.min_y + 1,
            },
            self.count,
        );

        match detail {
            RegionDetail::Basic => region,
            RegionDetail::Geometry => {
                let centroid = Point2::new(self.sum_x / self.count as f64, self.sum_y / self.count as f64);
                self.corners.sort_by_key(|p| (p.x, p.y));
                self.corners.dedup();
                let hull = convex_hull(&self.corners);
                region.with_geometry(polygon_area(&hull), centroid)
            }
        }
    }
}

/// Extracts external regions from masks
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeExtractor;

impl ShapeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// External, non-nested 8-connected regions. Holes are filled first, so a
    /// component sitting inside another one's hole is part of that region.
    pub fn extract_regions(&self, mask: &Mask, detail: RegionDetail) -> Vec<Region> {
        if mask.is_empty() {
            return Vec::new();
        }

        let filled = fill_holes(mask);
        let labels = connected_components(filled.as_gray(), Connectivity::Eight, Luma([0u8]));

        let mut regions: BTreeMap<u32, (u64, Accumulator)> = BTreeMap::new();
        let (width, height) = filled.dimensions();
        for y in 0..height {
            for x in 0..width {
                let label = labels.get_pixel(x, y)[0];
                if label == 0 {
                    continue;
                }

                let order = y as u64 * width as u64 + x as u64;
                let (_, acc) = regions
                    .entry(label)
                    .or_insert_with(|| (order, Accumulator::start(x, y)));
                acc.add(x, y);

                if detail == RegionDetail::Geometry && is_boundary(&filled, x, y) {
                    let (px, py) = (x as i32, y as i32);
                    acc.corners.extend([
                        Point::new(px, py),
                        Point::new(px + 1, py),
                        Point::new(px, py + 1),
                        Point::new(px + 1, py + 1),
                    ]);
                }
            }
        }

        let mut ordered: Vec<(u64, Accumulator)> = regions.into_values().collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered
            .into_iter()
            .map(|(_, acc)| acc.into_region(detail))
            .collect()
    }
}

/// Turn on every background pixel that is not 4-connected to the mask border
fn fill_holes(mask: &Mask) -> Mask {
    let (width, height) = mask.dimensions();
    let background: GrayImage = mask.inverted().into_gray();
    let labels = connected_components(&background, Connectivity::Four, Luma([0u8]));

    let mut outside = std::collections::HashSet::new();
    for x in 0..width {
        outside.insert(labels.get_pixel(x, 0)[0]);
        outside.insert(labels.get_pixel(x, height - 1)[0]);
    }
    for y in 0..height {
        outside.insert(labels.get_pixel(0, y)[0]);
        outside.insert(labels.get_pixel(width - 1, y)[0]);
    }

    Mask::from_fn(width, height, |x, y| {
        let label = labels.get_pixel(x, y)[0];
        mask.get(x, y) || !outside.contains(&label)
    })
}

fn is_boundary(mask: &Mask, x: u32, y: u32) -> bool {
    x == 0
        || y == 0
        || x + 1 >= mask.width()
        || y + 1 >= mask.height()
        || !mask.get(x - 1, y)
        || !mask.get(x + 1, y)
        || !mask.get(x, y - 1)
        || !mask.get(x, y + 1)
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}
