//! Morphological cleanup of binary masks

use crate::processing::mask::Mask;

/// Elliptical structuring element, stored as offsets from its anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    size: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// Discrete ellipse inscribed in a `size`x`size` square. Each row spans
    /// `round(c * sqrt(1 - dy^2 / r^2))` columns either side of the center.
    pub fn ellipse(size: u32) -> Self {
        let r = (size / 2) as i32;
        let c = r as f64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut offsets = Vec::new();
        for dy in -r..=r {
            let dx = (c * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
            for ox in -dx..=dx {
                offsets.push((ox, dy));
            }
        }

        Self { size, offsets }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        self.offsets.contains(&(dx, dy))
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }
}

/// Closing followed by opening with an elliptical kernel
#[derive(Debug, Clone)]
pub struct MaskCleaner {
    kernel: StructuringElement,
}

impl MaskCleaner {
    pub fn new(kernel_size: u32) -> Self {
        Self {
            kernel: StructuringElement::ellipse(kernel_size),
        }
    }

    pub fn kernel(&self) -> &StructuringElement {
        &self.kernel
    }

    /// Fill small holes, then strip isolated specks
    pub fn clean(&self, mask: &Mask) -> Mask {
        let closed = self.close(mask);
        self.open(&closed)
    }

    pub fn close(&self, mask: &Mask) -> Mask {
        erode(&dilate(mask, &self.kernel), &self.kernel)
    }

    pub fn open(&self, mask: &Mask) -> Mask {
        dilate(&erode(mask, &self.kernel), &self.kernel)
    }
}

/// A pixel turns on if any in-bounds pixel under the kernel is on
pub fn dilate(mask: &Mask, kernel: &StructuringElement) -> Mask {
    let (width, height) = mask.dimensions();
    Mask::from_fn(width, height, |x, y| {
        kernel
            .offsets()
            .iter()
            .any(|&(dx, dy)| sample(mask, x, y, dx, dy).unwrap_or(false))
    })
}

/// A pixel stays on only if every in-bounds pixel under the kernel is on
pub fn erode(mask: &Mask, kernel: &StructuringElement) -> Mask {
    let (width, height) = mask.dimensions();
    Mask::from_fn(width, height, |x, y| {
        kernel
            .offsets()
            .iter()
            .all(|&(dx, dy)| sample(mask, x, y, dx, dy).unwrap_or(true))
    })
}

// None when the offset falls outside the mask
fn sample(mask: &Mask, x: u32, y: u32, dx: i32, dy: i32) -> Option<bool> {
    let sx = x as i64 + dx as i64;
    let sy = y as i64 + dy as i64;
    if sx < 0 || sy < 0 || sx >= mask.width() as i64 || sy >= mask.height() as i64 {
        return None;
    }
    Some(mask.get(sx as u32, sy as u32))
}
