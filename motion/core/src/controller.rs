//! Command Facade
//!
//! [`MotionController`] is what the conversational layer talks to. Every
//! operation takes loosely typed arguments, saturates or defaults them, runs
//! the resulting choreography and answers with a short human-readable status.
//! No operation returns an error.
//!
//! # Concurrency
//!
//! Whole commands are serialized by a motion lock, so the steps of two
//! commands never interleave on the device. What happens to a command that
//! arrives while another one is running depends on [`BusyPolicy`]:
//!
//! - `Queue`: it waits for the running command to finish
//! - `Interrupt`: it stops the running command before that command's next
//!   step, then runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::choreography::{self, Choreography, DanceStyle, Emotion, MotionStep};
use crate::config::{BusyPolicy, MotionConfigFile, MotionSettings};
use crate::device::{Actuator, DeviceAdapter, DeviceError, MoveOutcome, RobotDevice};
use crate::gestures::{resolve, AntennaExpression, HeadDirection, NamedVariant, TiltSide};
use crate::pose::{AntennaState, Orientation};
use crate::safety;
use crate::sequencer::{self, SequenceReport, StopSignal};

/// Status returned by every operation once the controller is shut down
pub const SHUT_DOWN_MESSAGE: &str = "Motion controller is shut down";

/// Repetitions used when a nod or shake count is not given
pub const DEFAULT_REPEATS: i64 = 2;

/// Tilt angle used when none is given (degrees)
pub const DEFAULT_TILT_ANGLE: f32 = 20.0;

/// High-level motion commands for the robot
pub struct MotionController {
    actuator: Arc<dyn Actuator>,
    adapter: Option<Arc<DeviceAdapter>>,
    settings: MotionSettings,
    motion_lock: tokio::sync::Mutex<()>,
    current: Mutex<StopSignal>,
    closed: AtomicBool,
}

impl MotionController {
    /// Build a controller around an existing actuator
    ///
    /// [`shutdown`](Self::shutdown) stops motion but leaves the actuator's
    /// lifecycle to the caller.
    #[must_use]
    pub fn new(actuator: Arc<dyn Actuator>, settings: MotionSettings) -> Self {
        Self {
            actuator,
            adapter: None,
            settings,
            motion_lock: tokio::sync::Mutex::new(()),
            current: Mutex::new(StopSignal::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Start an actuator worker for `device` and build a controller on it
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Spawn`] if the worker thread cannot start.
    pub fn spawn<D: RobotDevice>(device: D, config: &MotionConfigFile) -> Result<Self, DeviceError> {
        let adapter = Arc::new(DeviceAdapter::spawn(device, &config.adapter_config())?);
        info!(
            device = adapter.device_name(),
            busy_policy = %config.busy_policy,
            "Motion controller ready"
        );
        let mut controller = Self::new(adapter.clone(), config.settings());
        controller.adapter = Some(adapter);
        Ok(controller)
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    /// Whether [`shutdown`](Self::shutdown) was called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop any running choreography, refuse new commands and stop the worker
    ///
    /// Waits for the in-flight device call to return. Safe to call twice.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.current.lock().raise();

        let _motion = self.motion_lock.lock().await;
        if let Some(adapter) = &self.adapter {
            adapter.shutdown().await;
        }
        info!("Motion controller shut down");
    }

    // =========================================================================
    // Head
    // =========================================================================

    /// Turn the head towards a named direction
    ///
    /// Unknown directions center the head. `duration` is in seconds.
    pub async fn move_head(&self, direction: &str, duration: Option<f32>) -> String {
        let direction = resolve::<HeadDirection>(direction).variant;
        let duration = self.head_duration(duration);
        info!(direction = direction.name(), ?duration, "move_head");

        let choreography = Choreography::single("move_head", direction.step(duration));
        self.perform(&choreography, format!("Moved head {}", direction.name()))
            .await
    }

    /// Move the head to explicit angles in degrees
    pub async fn move_head_precise(
        &self,
        roll: f32,
        pitch: f32,
        yaw: f32,
        duration: Option<f32>,
    ) -> String {
        let target = Orientation::new(roll, pitch, yaw).clamped();
        let duration = self.head_duration(duration);
        info!(%target, ?duration, "move_head_precise");

        let choreography =
            Choreography::single("move_head_precise", MotionStep::head(target, duration));
        self.perform(&choreography, format!("Moved head to {target}"))
            .await
    }

    /// Tilt the head sideways by `angle` degrees
    pub async fn tilt_head(&self, side: &str, angle: Option<f32>) -> String {
        let side = resolve::<TiltSide>(side).variant;
        let angle = safety::TILT_ANGLE.clamp(angle.unwrap_or(DEFAULT_TILT_ANGLE));
        info!(side = side.name(), angle, "tilt_head");

        let choreography = Choreography::single("tilt_head", side.step(angle));
        self.perform(&choreography, format!("Tilted head {}", side.name()))
            .await
    }

    /// Face the camera with antennas at rest
    pub async fn look_at_camera(&self) -> String {
        info!("look_at_camera");
        self.perform(&choreography::look_at_camera(), "Looking at camera".to_string())
            .await
    }

    // =========================================================================
    // Antennas
    // =========================================================================

    /// Set both antennas to angles in degrees
    pub async fn move_antennas(
        &self,
        right_angle: f32,
        left_angle: f32,
        duration: Option<f32>,
    ) -> String {
        let right = safety::ANTENNA_DEGREES.clamp(right_angle);
        let left = safety::ANTENNA_DEGREES.clamp(left_angle);
        let duration = duration.map_or(self.settings.antenna_duration, safety::move_duration);
        info!(right, left, ?duration, "move_antennas");

        let step = MotionStep::antennas(AntennaState::from_degrees(right, left), duration);
        let choreography = Choreography::single("move_antennas", step);
        self.perform(
            &choreography,
            format!("Moved antennas to right={right}, left={left} degrees"),
        )
        .await
    }

    /// Apply a named antenna preset
    pub async fn antenna_expression(&self, expression: &str) -> String {
        let expression = resolve::<AntennaExpression>(expression).variant;
        info!(expression = expression.name(), "antenna_expression");

        let choreography = Choreography::single("antenna_expression", expression.step());
        self.perform(
            &choreography,
            format!("Set antennas to {}", expression.name()),
        )
        .await
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Nod `times` times (1 to 5)
    pub async fn nod_yes(&self, times: Option<i64>) -> String {
        let times = safety::NOD_TIMES.clamp(times.unwrap_or(DEFAULT_REPEATS));
        info!(times, "nod_yes");
        self.perform(
            &choreography::nod_yes(times),
            format!("Nodded yes {times} times"),
        )
        .await
    }

    /// Shake the head `times` times (1 to 5)
    pub async fn shake_no(&self, times: Option<i64>) -> String {
        let times = safety::SHAKE_TIMES.clamp(times.unwrap_or(DEFAULT_REPEATS));
        info!(times, "shake_no");
        self.perform(
            &choreography::shake_no(times),
            format!("Shook head no {times} times"),
        )
        .await
    }

    /// Play an emotion
    ///
    /// Unknown emotions play the neutral pose instead.
    pub async fn express_emotion(&self, emotion: &str) -> String {
        let resolved = resolve::<Emotion>(emotion);
        info!(emotion = resolved.variant.name(), "express_emotion");

        let done = if resolved.fell_back {
            format!("Unknown emotion '{}', returned to neutral", emotion.trim())
        } else {
            format!("Expressed {}", resolved.variant.name())
        };
        self.perform(&resolved.variant.choreography(), done).await
    }

    /// Dance in the given style, ending at neutral
    pub async fn do_dance(&self, style: &str) -> String {
        let style = resolve::<DanceStyle>(style).variant;
        info!(style = style.name(), "do_dance");
        self.perform(
            &style.choreography(),
            format!("Finished {} dance", style.name()),
        )
        .await
    }

    /// Head centered and antennas at rest
    pub async fn reset_position(&self) -> String {
        info!("reset_position");
        self.perform(&choreography::reset(), "Reset to neutral position".to_string())
            .await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Run the robot's wake-up animation
    pub async fn wake_up(&self) -> String {
        info!("wake_up");
        let Some(_motion) = self.acquire().await else {
            return SHUT_DOWN_MESSAGE.to_string();
        };

        match failure_reason(self.actuator.wake_up().await) {
            None => "Woke up and ready!".to_string(),
            Some(reason) => format!("Wake up failed: {reason}"),
        }
    }

    /// Run the robot's go-to-rest animation
    pub async fn go_to_sleep(&self) -> String {
        info!("go_to_sleep");
        let Some(_motion) = self.acquire().await else {
            return SHUT_DOWN_MESSAGE.to_string();
        };

        match failure_reason(self.actuator.goto_sleep().await) {
            None => "Going to sleep...".to_string(),
            Some(reason) => format!("Sleep failed: {reason}"),
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn head_duration(&self, secs: Option<f32>) -> Duration {
        secs.map_or(self.settings.head_duration, safety::move_duration)
    }

    /// Take the motion lock, registering `stop` as the signal that stops
    /// whatever runs under it
    ///
    /// Returns `None` once the controller is shut down.
    async fn acquire_with(&self, stop: &StopSignal) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        if self.is_shut_down() {
            return None;
        }

        if self.settings.busy_policy == BusyPolicy::Interrupt {
            let previous = std::mem::replace(&mut *self.current.lock(), stop.clone());
            previous.raise();
        }

        let guard = self.motion_lock.lock().await;
        if self.is_shut_down() {
            return None;
        }

        if self.settings.busy_policy == BusyPolicy::Queue {
            *self.current.lock() = stop.clone();
        }
        Some(guard)
    }

    async fn acquire(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        self.acquire_with(&StopSignal::new()).await
    }

    async fn run(&self, choreography: &Choreography) -> Option<SequenceReport> {
        let stop = StopSignal::new();
        let _motion = self.acquire_with(&stop).await?;
        Some(sequencer::run(self.actuator.as_ref(), choreography, &stop).await)
    }

    async fn perform(&self, choreography: &Choreography, done: String) -> String {
        let Some(report) = self.run(choreography).await else {
            return SHUT_DOWN_MESSAGE.to_string();
        };

        if report.failed > 0 {
            warn!(
                name = %report.name,
                failed = report.failed,
                total = report.total,
                "Command finished with failed steps"
            );
        }

        if report.stopped {
            format!(
                "Stopped {} after {} of {} steps",
                report.name, report.issued, report.total
            )
        } else {
            done
        }
    }
}

impl std::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("settings", &self.settings)
            .field("adapter", &self.adapter)
            .field("closed", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

fn failure_reason(outcome: MoveOutcome) -> Option<String> {
    match outcome {
        MoveOutcome::Completed => None,
        MoveOutcome::Failed(e) => Some(e.to_string()),
        MoveOutcome::TimedOut => Some("device did not respond in time".to_string()),
    }
}
