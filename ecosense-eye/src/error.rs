//! Error types for ecosense-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// The analysis pipeline has not been initialized yet. Retry once
    /// `VisionEngine::initialize` has completed.
    #[error("Vision engine not ready")]
    EngineNotReady,

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VisionError {
    /// Whether the same call may succeed once the engine has caught up
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisionError::EngineNotReady)
    }
}
