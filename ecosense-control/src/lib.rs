//! ecosense-control: hands-free UI control from live camera gestures
//!
//! A [`ControlLoop`] samples frames from a [`VideoSource`], runs the
//! ecosense-eye gesture pipeline on each and turns the result into hover,
//! click and scroll actions on a [`UiSurface`].

pub mod camera;
pub mod cancel;
pub mod config;
pub mod control;
pub mod error;
pub mod state;
pub mod ui;

#[cfg(feature = "opencv")]
pub use camera::OpenCvSource;
pub use camera::{CameraResource, CameraSlot, VideoSource, VideoStream};
pub use cancel::CancellationToken;
pub use config::ControlConfig;
pub use control::ControlLoop;
pub use error::ControlError;
pub use state::{map_to_screen, ControlState, GestureAction, LoopPhase};
pub use ui::{ElementHandle, ScreenPoint, UiSurface, Viewport};
