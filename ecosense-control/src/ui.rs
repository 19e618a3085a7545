//! The UI capability driven by gestures

use serde::{Deserialize, Serialize};

/// Point in screen (viewport) pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Opaque reference to an interactive element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Surface the control loop hovers, clicks and scrolls.
///
/// Calls are made from the sampling task, one tick at a time.
pub trait UiSurface: Send + Sync {
    fn viewport(&self) -> Viewport;

    /// Topmost interactive element under a screen point
    fn element_at(&self, point: ScreenPoint) -> Option<ElementHandle>;

    fn click(&self, element: &ElementHandle);

    /// Scroll vertically by `delta` pixels (positive is down)
    fn scroll_by(&self, delta: f64);
}
