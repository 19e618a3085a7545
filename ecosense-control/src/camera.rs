//! Live video acquisition and scoped ownership of the camera

use crate::error::ControlError;
use async_trait::async_trait;
use image::RgbImage;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// An open video stream
pub trait VideoStream: Send {
    /// Next frame. `Ok(None)` means the stream has ended for good.
    fn read_frame(&mut self) -> Result<Option<RgbImage>, ControlError>;

    /// Stop all tracks. Must be safe to call more than once.
    fn stop(&mut self);
}

/// Something that can open a live video stream
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Open a stream, using `resolution` as a hint
    async fn acquire(&self, resolution: (u32, u32)) -> Result<Box<dyn VideoStream>, ControlError>;
}

/// Exclusive handle on an acquired stream; stops it on drop
pub struct CameraResource {
    stream: Box<dyn VideoStream>,
    released: bool,
}

impl CameraResource {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    pub fn read_frame(&mut self) -> Result<Option<RgbImage>, ControlError> {
        if self.released {
            return Ok(None);
        }
        self.stream.read_frame()
    }

    /// Stop the stream now instead of at drop
    pub fn release(mut self) {
        self.stop_stream();
    }

    fn stop_stream(&mut self) {
        if !self.released {
            self.stream.stop();
            self.released = true;
            info!("Camera released");
        }
    }
}

impl Drop for CameraResource {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

/// Camera of a running session, shared between the sampling task and `stop()`.
///
/// Whoever calls `release` first stops the stream. Reads after that report
/// the end of the stream, even from a job that still holds a clone.
#[derive(Clone)]
pub struct CameraSlot {
    camera: Arc<Mutex<Option<CameraResource>>>,
}

impl CameraSlot {
    pub fn new(camera: CameraResource) -> Self {
        Self {
            camera: Arc::new(Mutex::new(Some(camera))),
        }
    }

    /// Next frame from the held camera; `Ok(None)` once released
    pub fn read_frame(&self) -> Result<Option<RgbImage>, ControlError> {
        match self.camera.lock().as_mut() {
            Some(camera) => camera.read_frame(),
            None => Ok(None),
        }
    }

    /// Stop the stream. Waits for a read in progress to finish.
    pub fn release(&self) {
        let camera = self.camera.lock().take();
        if let Some(camera) = camera {
            camera.release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.camera.lock().is_none()
    }
}

#[cfg(feature = "opencv")]
pub use self::webcam::OpenCvSource;

#[cfg(feature = "opencv")]
mod webcam {
    use super::{VideoSource, VideoStream};
    use crate::error::ControlError;
    use async_trait::async_trait;
    use image::RgbImage;
    use opencv::{
        core::Mat,
        imgproc,
        prelude::*,
        videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
    };
    use tracing::info;

    /// USB webcam opened through OpenCV
    pub struct OpenCvSource {
        camera_id: i32,
        frame_rate: u32,
    }

    impl OpenCvSource {
        pub fn new(camera_id: i32, frame_rate: u32) -> Self {
            Self { camera_id, frame_rate }
        }
    }

    #[async_trait]
    impl VideoSource for OpenCvSource {
        async fn acquire(&self, resolution: (u32, u32)) -> Result<Box<dyn VideoStream>, ControlError> {
            let (camera_id, frame_rate) = (self.camera_id, self.frame_rate);
            let stream = tokio::task::spawn_blocking(move || open_capture(camera_id, resolution, frame_rate))
                .await
                .map_err(|e| ControlError::DeviceAccessDenied(format!("Camera open task failed: {}", e)))??;
            Ok(Box::new(stream))
        }
    }

    fn open_capture(camera_id: i32, resolution: (u32, u32), frame_rate: u32) -> Result<OpenCvStream, ControlError> {
        let denied = |e: opencv::Error| ControlError::DeviceAccessDenied(format!("Camera {}: {}", camera_id, e));

        let mut capture = VideoCapture::new(camera_id, CAP_ANY).map_err(denied)?;
        if !capture.is_opened().map_err(denied)? {
            return Err(ControlError::DeviceAccessDenied(format!(
                "Camera {} failed to open",
                camera_id
            )));
        }

        // Resolution and rate are hints; drivers may pick the closest mode
        capture.set(CAP_PROP_FRAME_WIDTH, resolution.0 as f64).map_err(denied)?;
        capture.set(CAP_PROP_FRAME_HEIGHT, resolution.1 as f64).map_err(denied)?;
        capture.set(CAP_PROP_FPS, frame_rate as f64).map_err(denied)?;

        info!(
            "Camera {} opened at {}x{} @ {}fps",
            camera_id, resolution.0, resolution.1, frame_rate
        );
        Ok(OpenCvStream {
            capture: Some(capture),
            camera_id,
        })
    }

    struct OpenCvStream {
        capture: Option<VideoCapture>,
        camera_id: i32,
    }

    impl VideoStream for OpenCvStream {
        fn read_frame(&mut self) -> Result<Option<RgbImage>, ControlError> {
            let Some(capture) = self.capture.as_mut() else {
                return Ok(None);
            };
            let capture_err = |e: opencv::Error| ControlError::Capture(e.to_string());

            if !capture.is_opened().map_err(capture_err)? {
                return Ok(None);
            }

            let mut frame = Mat::default();
            let grabbed = capture.read(&mut frame).map_err(capture_err)?;
            if !grabbed || frame.empty() {
                return Err(ControlError::Capture(format!("Camera {} returned no frame", self.camera_id)));
            }

            let mut rgb = Mat::default();
            imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(capture_err)?;

            let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
            let bytes = rgb.data_bytes().map_err(capture_err)?.to_vec();
            RgbImage::from_raw(width, height, bytes)
                .map(Some)
                .ok_or_else(|| ControlError::Capture("Frame buffer size mismatch".to_string()))
        }

        fn stop(&mut self) {
            if let Some(mut capture) = self.capture.take() {
                let _ = capture.release();
                info!("Camera {} stopped", self.camera_id);
            }
        }
    }
}
