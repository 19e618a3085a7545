//! Error types for ecosense-control

use ecosense_eye::VisionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    /// The video device could not be acquired (permission denied, busy, missing)
    #[error("Camera access denied: {0}")]
    DeviceAccessDenied(String),

    #[error("Control loop already running")]
    AlreadyRunning,

    /// `stop()` was requested while `start()` was still acquiring the camera
    #[error("Control loop start cancelled")]
    Cancelled,

    /// A single frame could not be read; the loop keeps going
    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

impl ControlError {
    /// Whether the error only affects the current tick
    pub fn is_transient(&self) -> bool {
        match self {
            ControlError::Capture(_) => true,
            ControlError::Vision(err) => err.is_retryable() || matches!(err, VisionError::UnsupportedImage(_)),
            _ => false,
        }
    }
}
