//! Drive a logging UI surface from a webcam until Ctrl-C or a time limit

use anyhow::Context;
use ecosense_control::{ControlConfig, ControlLoop, ElementHandle, OpenCvSource, ScreenPoint, UiSurface, Viewport};
use ecosense_eye::{VisionConfig, VisionEngine};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pretends the screen is a grid of 240px buttons and logs every action
struct LoggingSurface {
    viewport: Viewport,
}

impl UiSurface for LoggingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn element_at(&self, point: ScreenPoint) -> Option<ElementHandle> {
        if point.x < 0.0 || point.y < 0.0 || point.x >= self.viewport.width || point.y >= self.viewport.height {
            return None;
        }
        let (col, row) = ((point.x / 240.0) as u32, (point.y / 240.0) as u32);
        Some(ElementHandle::new(format!("button-{}-{}", col, row)))
    }

    fn click(&self, element: &ElementHandle) {
        info!("click {}", element.id);
    }

    fn scroll_by(&self, delta: f64) {
        info!("scroll {:+.1}", delta);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let camera_id: i32 = match args.get(1) {
        Some(id) => id.parse().context("camera id must be an integer")?,
        None => 0,
    };
    let seconds: u64 = match args.get(2) {
        Some(s) => s.parse().context("duration must be whole seconds")?,
        None => 30,
    };
    let config = match args.get(3) {
        Some(path) => ControlConfig::load(path)?,
        None => ControlConfig::default(),
    };

    let engine = Arc::new(VisionEngine::ready(VisionConfig::default())?);
    let source = Arc::new(OpenCvSource::new(camera_id, config.frame_rate));
    let surface = Arc::new(LoggingSurface {
        viewport: Viewport {
            width: 1920.0,
            height: 1080.0,
        },
    });

    let control = ControlLoop::new(config, engine, source, surface)?;
    control.start().await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => info!("Time limit reached"),
    }

    let last = control.state();
    control.stop().await;
    println!("Last gesture: {:?}, cursor ({:.0}, {:.0})", last.current_gesture, last.cursor_position.x, last.cursor_position.y);
    Ok(())
}
