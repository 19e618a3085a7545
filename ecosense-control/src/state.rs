//! Control state and the gesture to UI action mapping

use crate::ui::{ScreenPoint, Viewport};
use ecosense_eye::{Gesture, Point2};
use serde::{Deserialize, Serialize};

/// Lifecycle of a control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopPhase {
    Idle,
    /// Camera acquisition in progress
    Starting,
    Active,
    /// `stop()` is draining the sampling task and releasing the camera
    Stopping,
}

/// Observable state of the gesture controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    pub is_active: bool,
    /// `None` until the first gesture sample arrives
    pub current_gesture: Option<Gesture>,
    pub cursor_position: ScreenPoint,
    /// Id of the element last hovered by a pointing hand
    pub selected_element: Option<String>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            is_active: false,
            current_gesture: None,
            cursor_position: ScreenPoint::default(),
            selected_element: None,
        }
    }
}

/// Scale a frame position onto the viewport
pub fn map_to_screen(position: Point2, frame_size: (u32, u32), viewport: Viewport) -> ScreenPoint {
    let (width, height) = frame_size;
    if width == 0 || height == 0 {
        return ScreenPoint::default();
    }
    ScreenPoint::new(
        position.x / width as f64 * viewport.width,
        position.y / height as f64 * viewport.height,
    )
}

/// What the UI should do for one gesture sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Select the element under the cursor
    Hover(ScreenPoint),
    /// Click the element under the cursor
    Click(ScreenPoint),
    Scroll(f64),
    Idle,
}

impl GestureAction {
    pub fn plan(gesture: Gesture, cursor: ScreenPoint, viewport: Viewport, scroll_factor: f64) -> Self {
        match gesture {
            Gesture::Point => GestureAction::Hover(cursor),
            Gesture::Fist => GestureAction::Click(cursor),
            Gesture::Open => GestureAction::Scroll((cursor.y - viewport.height / 2.0) * scroll_factor),
            Gesture::Unknown => GestureAction::Idle,
        }
    }
}
