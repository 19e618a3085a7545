//! Continuous gesture sampling that drives a UI surface

use crate::camera::{CameraResource, CameraSlot, VideoSource};
use crate::cancel::CancellationToken;
use crate::config::ControlConfig;
use crate::error::ControlError;
use crate::state::{map_to_screen, ControlState, GestureAction, LoopPhase};
use crate::ui::UiSurface;
use ecosense_eye::{GestureDetector, GestureSample, VisionError};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A `stop()` in progress
struct Draining {
    /// Session being stopped
    session: CancellationToken,
    /// Fired once the session is fully torn down
    done: CancellationToken,
}

struct Lifecycle {
    phase: LoopPhase,
    /// Token of the current session; taken by `stop()`
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    camera: Option<CameraSlot>,
    draining: Option<Draining>,
}

impl Lifecycle {
    fn owned_by(&self, token: &CancellationToken) -> bool {
        self.token.as_ref().map_or(false, |current| current.same_as(token))
    }
}

/// Return to Idle once `session` has been drained. No-op if another stop
/// already finished it.
fn finish_stop(lifecycle: &Mutex<Lifecycle>, state: &RwLock<ControlState>, session: &CancellationToken) -> bool {
    let mut lifecycle = lifecycle.lock();
    let owns = lifecycle
        .draining
        .as_ref()
        .map_or(false, |draining| draining.session.same_as(session));
    if !owns {
        return false;
    }
    if let Some(draining) = lifecycle.draining.take() {
        draining.done.cancel();
    }
    lifecycle.phase = LoopPhase::Idle;
    lifecycle.task = None;
    lifecycle.camera = None;
    *state.write() = ControlState::default();
    true
}

/// Gesture controller: samples a live camera, classifies the hand and
/// hovers, clicks or scrolls the UI accordingly.
///
/// At most one sampling session runs at a time. `stop()` may be called from
/// any state; once it returns the camera is released, the state is reset and
/// nothing changes again until the next `start()`.
pub struct ControlLoop {
    config: Arc<ControlConfig>,
    detector: Arc<dyn GestureDetector>,
    source: Arc<dyn VideoSource>,
    ui: Arc<dyn UiSurface>,
    state: Arc<RwLock<ControlState>>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl ControlLoop {
    /// Build an idle loop. Fails if `config` does not validate.
    pub fn new(
        config: ControlConfig,
        detector: Arc<dyn GestureDetector>,
        source: Arc<dyn VideoSource>,
        ui: Arc<dyn UiSurface>,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            detector,
            source,
            ui,
            state: Arc::new(RwLock::new(ControlState::default())),
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                phase: LoopPhase::Idle,
                token: None,
                task: None,
                camera: None,
                draining: None,
            })),
        })
    }

    /// Snapshot of the current control state
    pub fn state(&self) -> ControlState {
        self.state.read().clone()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> LoopPhase {
        self.lifecycle.lock().phase
    }

    /// Validated configuration this loop runs with
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Acquire the camera and begin sampling
    pub async fn start(&self) -> Result<(), ControlError> {
        let token = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.phase != LoopPhase::Idle {
                return Err(ControlError::AlreadyRunning);
            }
            if !self.detector.is_ready() {
                return Err(VisionError::EngineNotReady.into());
            }
            let token = CancellationToken::new();
            lifecycle.phase = LoopPhase::Starting;
            lifecycle.token = Some(token.clone());
            token
        };

        let (width, height) = self.config.resolution;
        info!(
            "Starting gesture control ({}x{} @ {}fps)",
            width, height, self.config.frame_rate
        );

        let stream = match self.source.acquire(self.config.resolution).await {
            Ok(stream) => stream,
            Err(e) => {
                if token.is_cancelled() {
                    finish_stop(&self.lifecycle, &self.state, &token);
                    return Err(ControlError::Cancelled);
                }
                self.abandon_start(&token);
                warn!("Camera acquisition failed: {}", e);
                return Err(match e {
                    ControlError::DeviceAccessDenied(reason) => ControlError::DeviceAccessDenied(reason),
                    other => ControlError::DeviceAccessDenied(other.to_string()),
                });
            }
        };
        let camera = CameraResource::new(stream);

        let mut lifecycle = self.lifecycle.lock();
        if token.is_cancelled() {
            drop(lifecycle);
            camera.release();
            finish_stop(&self.lifecycle, &self.state, &token);
            info!("Gesture control start cancelled during camera acquisition");
            return Err(ControlError::Cancelled);
        }

        self.state.write().is_active = true;
        lifecycle.phase = LoopPhase::Active;

        let camera = CameraSlot::new(camera);
        lifecycle.camera = Some(camera.clone());
        let sampler = Sampler {
            config: self.config.clone(),
            detector: self.detector.clone(),
            ui: self.ui.clone(),
            state: self.state.clone(),
            lifecycle: self.lifecycle.clone(),
            token,
        };
        lifecycle.task = Some(tokio::spawn(sampler.run(camera)));

        info!("Gesture control active");
        Ok(())
    }

    fn abandon_start(&self, token: &CancellationToken) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.owned_by(token) {
            lifecycle.token = None;
            lifecycle.phase = LoopPhase::Idle;
        }
    }

    /// Cancel sampling, release the camera and reset the state.
    ///
    /// Concurrent callers all return once the session is torn down.
    pub async fn stop(&self) {
        let (session, done, task, camera) = {
            let mut lifecycle = self.lifecycle.lock();
            let phase = lifecycle.phase;
            match phase {
                LoopPhase::Idle => return,
                LoopPhase::Stopping => match lifecycle.draining.as_ref() {
                    Some(draining) => (None, draining.done.clone(), None, None),
                    None => return,
                },
                LoopPhase::Starting | LoopPhase::Active => {
                    let Some(session) = lifecycle.token.take() else {
                        return;
                    };
                    session.cancel();
                    let done = CancellationToken::new();
                    lifecycle.draining = Some(Draining {
                        session: session.clone(),
                        done: done.clone(),
                    });
                    lifecycle.phase = LoopPhase::Stopping;
                    (Some(session), done, lifecycle.task.take(), lifecycle.camera.take())
                }
            }
        };

        // Another stop is already draining this session
        let Some(session) = session else {
            done.cancelled().await;
            return;
        };

        match task {
            Some(mut task) => {
                if tokio::time::timeout(self.config.stop_timeout(), &mut task).await.is_err() {
                    warn!(
                        "Sampling task did not finish within {:?}, aborting",
                        self.config.stop_timeout()
                    );
                    task.abort();
                    let _ = task.await;
                }
            }
            None => {
                // Stopped during acquisition: `start()` releases the camera it gets
                if tokio::time::timeout(self.config.stop_timeout(), done.cancelled()).await.is_err() {
                    warn!("Camera acquisition did not return within {:?}", self.config.stop_timeout());
                }
            }
        }

        // A detection job may still hold a clone of the slot
        if let Some(camera) = camera {
            camera.release();
        }

        if finish_stop(&self.lifecycle, &self.state, &session) {
            info!("Gesture control stopped");
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        let mut lifecycle = self.lifecycle.lock();
        if let Some(token) = lifecycle.token.take() {
            token.cancel();
        }
        if let Some(task) = lifecycle.task.take() {
            task.abort();
        }
        if let Some(camera) = lifecycle.camera.take() {
            camera.release();
        }
    }
}

enum TickOutcome {
    StreamEnded,
    Sampled {
        frame_size: (u32, u32),
        sample: Option<GestureSample>,
    },
}

/// Read one frame and run the gesture pipeline on it. Runs on a blocking worker.
fn sample_frame(camera: &CameraSlot, detector: &dyn GestureDetector) -> Result<TickOutcome, ControlError> {
    let Some(frame) = camera.read_frame()? else {
        return Ok(TickOutcome::StreamEnded);
    };
    let sample = detector.detect_gesture(&frame)?;
    Ok(TickOutcome::Sampled {
        frame_size: frame.dimensions(),
        sample,
    })
}

/// The sampling task of one session
struct Sampler {
    config: Arc<ControlConfig>,
    detector: Arc<dyn GestureDetector>,
    ui: Arc<dyn UiSurface>,
    state: Arc<RwLock<ControlState>>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    token: CancellationToken,
}

impl Sampler {
    async fn run(self, camera: CameraSlot) {
        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stream_ended = false;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let job = {
                let camera = camera.clone();
                let detector = self.detector.clone();
                tokio::task::spawn_blocking(move || sample_frame(&camera, detector.as_ref()))
            };

            match job.await {
                Ok(Ok(TickOutcome::Sampled { frame_size, sample })) => {
                    if let Some(sample) = sample {
                        self.apply(sample, frame_size);
                    }
                }
                // Released by stop() while the read was queued
                Ok(Ok(TickOutcome::StreamEnded)) if self.token.is_cancelled() => break,
                Ok(Ok(TickOutcome::StreamEnded)) => {
                    info!("Video stream ended");
                    stream_ended = true;
                    break;
                }
                Ok(Err(e)) if e.is_transient() => warn!("Gesture tick failed: {}", e),
                Ok(Err(e)) => error!("Gesture tick failed: {}", e),
                Err(e) => error!("Gesture pipeline panicked: {}", e),
            }
        }

        camera.release();

        if stream_ended {
            self.end_session();
        }
        debug!("Sampling task finished");
    }

    /// Apply one finished tick, unless the session was cancelled meanwhile.
    /// The state lock is released before the UI is called.
    fn apply(&self, sample: GestureSample, frame_size: (u32, u32)) {
        let viewport = self.ui.viewport();
        let action = {
            let mut state = self.state.write();
            if self.token.is_cancelled() {
                return;
            }
            let cursor = map_to_screen(sample.position, frame_size, viewport);
            state.current_gesture = Some(sample.gesture);
            state.cursor_position = cursor;
            GestureAction::plan(sample.gesture, cursor, viewport, self.config.scroll_factor)
        };

        match action {
            GestureAction::Hover(at) => {
                if let Some(element) = self.ui.element_at(at) {
                    let mut state = self.state.write();
                    if !self.token.is_cancelled() {
                        state.selected_element = Some(element.id);
                    }
                }
            }
            GestureAction::Click(at) => {
                if let Some(element) = self.ui.element_at(at) {
                    debug!("Clicking {}", element.id);
                    self.ui.click(&element);
                }
            }
            GestureAction::Scroll(delta) => self.ui.scroll_by(delta),
            GestureAction::Idle => {}
        }
    }

    fn end_session(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.owned_by(&self.token) {
            lifecycle.token = None;
            lifecycle.task = None;
            lifecycle.camera = None;
            lifecycle.phase = LoopPhase::Idle;
            *self.state.write() = ControlState::default();
            info!("Gesture control ended with the video stream");
        }
    }
}
