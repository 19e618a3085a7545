//! Binary masks

use image::{GrayImage, Luma};

const ON: Luma<u8> = Luma([255]);
const OFF: Luma<u8> = Luma([0]);

/// Binary mask stored as 0/255 intensity, same size as the image it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    /// All-off mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    /// Mask whose pixel (x, y) is on where `f(x, y)` holds
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        Self {
            pixels: GrayImage::from_fn(width, height, |x, y| if f(x, y) { ON } else { OFF }),
        }
    }

    /// Binarize a grayscale image: any non-zero pixel is on
    pub fn from_gray(gray: GrayImage) -> Self {
        let mut pixels = gray;
        for p in pixels.pixels_mut() {
            *p = if p[0] > 0 { ON } else { OFF };
        }
        Self { pixels }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Out-of-bounds coordinates read as off
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.pixels.get_pixel(x, y)[0] > 0
    }

    /// Turn a pixel on or off. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width() && y < self.height() {
            self.pixels.put_pixel(x, y, if on { ON } else { OFF });
        }
    }

    /// Number of on pixels
    pub fn count_on(&self) -> u64 {
        self.pixels.pixels().filter(|p| p[0] > 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.pixels().all(|p| p[0] == 0)
    }

    /// Mask with every pixel flipped
    pub fn inverted(&self) -> Mask {
        let mut pixels = self.pixels.clone();
        for p in pixels.pixels_mut() {
            *p = if p[0] > 0 { OFF } else { ON };
        }
        Self { pixels }
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }
}
