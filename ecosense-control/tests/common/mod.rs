//! Fakes shared by the control loop tests

#![allow(dead_code)]

use async_trait::async_trait;
use ecosense_control::{ControlError, ElementHandle, ScreenPoint, UiSurface, VideoSource, VideoStream, Viewport};
use ecosense_eye::{Gesture, GestureDetector, GestureSample, Point2, VisionError};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const FRAME_SIZE: (u32, u32) = (200, 150);
pub const VIEWPORT: Viewport = Viewport {
    width: 1000.0,
    height: 600.0,
};

/// 200x150 light frame with a dark 90x90 square in the middle
pub fn hand_frame() -> RgbImage {
    RgbImage::from_fn(FRAME_SIZE.0, FRAME_SIZE.1, |x, y| {
        if (55..145).contains(&x) && (30..120).contains(&y) {
            Rgb([25, 25, 25])
        } else {
            Rgb([230, 230, 230])
        }
    })
}

pub struct FakeStream {
    frame: RgbImage,
    remaining: Option<usize>,
    stopped: bool,
    stops: Arc<AtomicUsize>,
}

impl VideoStream for FakeStream {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, ControlError> {
        if self.stopped {
            return Ok(None);
        }
        match self.remaining.as_mut() {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.frame.clone()))
            }
            None => Ok(Some(self.frame.clone())),
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Camera double: can deny access, delay acquisition or end after N frames
pub struct FakeCamera {
    pub deny: bool,
    pub delay: Option<Duration>,
    pub frame_limit: Option<usize>,
    pub acquisitions: AtomicUsize,
    pub stops: Arc<AtomicUsize>,
    pub last_resolution: Mutex<Option<(u32, u32)>>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            deny: false,
            delay: None,
            frame_limit: None,
            acquisitions: AtomicUsize::new(0),
            stops: Arc::new(AtomicUsize::new(0)),
            last_resolution: Mutex::new(None),
        }
    }

    pub fn denied() -> Self {
        Self { deny: true, ..Self::new() }
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for FakeCamera {
    async fn acquire(&self, resolution: (u32, u32)) -> Result<Box<dyn VideoStream>, ControlError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *self.last_resolution.lock() = Some(resolution);
        if self.deny {
            return Err(ControlError::DeviceAccessDenied("NotAllowedError".to_string()));
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            frame: hand_frame(),
            remaining: self.frame_limit,
            stopped: false,
            stops: self.stops.clone(),
        }))
    }
}

/// Detector that returns a fixed sample, optionally failing, panicking or
/// taking `delay` per frame
pub struct ScriptedDetector {
    pub ready: bool,
    pub sample: Option<GestureSample>,
    pub delay: Option<Duration>,
    pub failures: AtomicUsize,
    pub panic_once: AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn returning(gesture: Gesture, x: f64, y: f64) -> Self {
        Self {
            ready: true,
            sample: Some(GestureSample {
                position: Point2::new(x, y),
                gesture,
            }),
            delay: None,
            failures: AtomicUsize::new(0),
            panic_once: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(gesture: Gesture, x: f64, y: f64, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::returning(gesture, x, y)
        }
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::returning(Gesture::Unknown, 0.0, 0.0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GestureDetector for ScriptedDetector {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn detect_gesture(&self, _frame: &RgbImage) -> Result<Option<GestureSample>, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(VisionError::UnsupportedImage("corrupt frame".to_string()));
        }
        if self.panic_once.swap(false, Ordering::SeqCst) {
            panic!("detector crashed");
        }
        Ok(self.sample)
    }
}

/// UI double that records every call
pub struct RecordingSurface {
    pub element: Option<String>,
    pub lookups: Mutex<Vec<ScreenPoint>>,
    pub clicks: Mutex<Vec<String>>,
    pub scrolls: Mutex<Vec<f64>>,
}

impl RecordingSurface {
    pub fn with_element(id: &str) -> Self {
        Self {
            element: Some(id.to_string()),
            ..Self::empty()
        }
    }

    pub fn empty() -> Self {
        Self {
            element: None,
            lookups: Mutex::new(Vec::new()),
            clicks: Mutex::new(Vec::new()),
            scrolls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.lookups.lock().len() + self.clicks.lock().len() + self.scrolls.lock().len()
    }
}

impl UiSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        VIEWPORT
    }

    fn element_at(&self, point: ScreenPoint) -> Option<ElementHandle> {
        self.lookups.lock().push(point);
        self.element.as_deref().map(ElementHandle::new)
    }

    fn click(&self, element: &ElementHandle) {
        self.clicks.lock().push(element.id.clone());
    }

    fn scroll_by(&self, delta: f64) {
        self.scrolls.lock().push(delta);
    }
}

/// Poll `condition` every 10ms for up to 3 seconds
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..300 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Await `future`, failing the test if it takes longer than 3 seconds
pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(3), future)
        .await
        .expect("operation timed out")
}
