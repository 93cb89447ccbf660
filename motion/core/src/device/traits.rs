//! Device Traits
//!
//! Two seams separate motion logic from hardware:
//!
//! - [`RobotDevice`]: the synchronous, possibly slow actuator driver. This is
//!   the only outbound interface of the crate.
//! - [`Actuator`]: the async face the sequencer talks to. It never fails;
//!   device errors come back as a [`MoveOutcome`].
//!
//! [`MoveCommand`] is the only value a device ever receives for a move, and it
//! can only be built from a [`MotionStep`] through the safety clamp.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::choreography::MotionStep;
use crate::pose::{head_pose_from, AntennaState, HeadPose};

/// Errors raised by a device or by the path to it
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// Communication with the motor controller failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// An actuator reported a fault
    #[error("Actuator fault: {0}")]
    Actuator(String),

    /// The device call panicked
    #[error("Device call panicked: {0}")]
    Panicked(String),

    /// The actuator worker is gone
    #[error("Actuator worker disconnected")]
    Disconnected,

    /// The actuator worker could not be started
    #[error("Failed to start actuator worker: {0}")]
    Spawn(String),
}

/// A clamped, device-ready move
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveCommand {
    head: Option<HeadPose>,
    antennas: Option<AntennaState>,
    duration: Duration,
}

impl MoveCommand {
    /// Clamp a step's targets and build the device command
    #[must_use]
    pub fn from_step(step: &MotionStep) -> Self {
        Self {
            head: step
                .orientation
                .map(|orientation| head_pose_from(orientation.clamped())),
            antennas: step.antennas.map(AntennaState::clamped),
            duration: step.duration,
        }
    }

    /// Head target, if the head moves
    #[must_use]
    pub fn head(&self) -> Option<HeadPose> {
        self.head
    }

    /// Antenna target, if the antennas move
    #[must_use]
    pub fn antennas(&self) -> Option<AntennaState> {
        self.antennas
    }

    /// Duration hint for the move
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl std::fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.head {
            Some(head) => write!(f, "head({})", head.orientation())?,
            None => write!(f, "head(-)")?,
        }
        match self.antennas {
            Some(a) => write!(f, " antennas({:.2}, {:.2})", a.right, a.left)?,
            None => write!(f, " antennas(-)")?,
        }
        write!(f, " over {}ms", self.duration.as_millis())
    }
}

/// Synchronous actuator driver
///
/// Implementations may block for the whole move. They are only ever called
/// from the actuator worker thread, one call at a time.
pub trait RobotDevice: Send + 'static {
    /// Driver name for logs
    fn name(&self) -> &str;

    /// Move head and/or antennas, returning once the device is done
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or actuator fault.
    fn goto_target(&mut self, command: &MoveCommand) -> Result<(), DeviceError>;

    /// Run the device's wake-up animation
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or actuator fault.
    fn wake_up(&mut self) -> Result<(), DeviceError>;

    /// Run the device's go-to-rest animation
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or actuator fault.
    fn goto_sleep(&mut self) -> Result<(), DeviceError>;
}

/// How a single device call ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The device call returned successfully
    Completed,
    /// The device call failed (already logged)
    Failed(DeviceError),
    /// The caller stopped waiting; the call may still finish on the worker
    TimedOut,
}

/// Non-blocking access to the actuators
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Issue a move and wait for its completion signal
    async fn move_to(&self, command: MoveCommand) -> MoveOutcome;

    /// Issue the wake-up lifecycle call
    async fn wake_up(&self) -> MoveOutcome;

    /// Issue the sleep lifecycle call
    async fn goto_sleep(&self) -> MoveOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Orientation;

    #[test]
    fn test_move_command_clamps_head() {
        let step = MotionStep::head(Orientation::new(50.0, 0.0, -60.0), Duration::from_millis(500));
        let command = MoveCommand::from_step(&step);
        let head = command.head().unwrap().orientation();
        assert_eq!(head, Orientation::new(30.0, 0.0, -45.0));
        assert_eq!(command.antennas(), None);
        assert_eq!(command.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_move_command_clamps_antennas() {
        let step = MotionStep::antennas(AntennaState::radians(3.0, -2.0), Duration::from_millis(300));
        let command = MoveCommand::from_step(&step);
        assert_eq!(command.antennas(), Some(AntennaState::radians(1.57, -1.57)));
        assert!(command.head().is_none());
    }

    #[test]
    fn test_display() {
        let step = MotionStep::both(
            Orientation::yaw(25.0),
            AntennaState::radians(0.5, -0.5),
            Duration::from_millis(200),
        );
        let text = MoveCommand::from_step(&step).to_string();
        assert_eq!(text, "head(roll=0, pitch=0, yaw=25) antennas(0.50, -0.50) over 200ms");
    }
}
