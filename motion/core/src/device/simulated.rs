//! Simulated Device
//!
//! Stand-in for the motor driver when no robot is attached. Every call is
//! logged and the last commanded pose is kept so it can be inspected.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::traits::{DeviceError, MoveCommand, RobotDevice};
use crate::pose::{AntennaState, Orientation};

/// What the simulated robot is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SimulatedState {
    /// Last commanded head orientation (degrees, clamped)
    pub head: Orientation,
    /// Last commanded antenna angles (radians, clamped)
    pub antennas: AntennaState,
    /// Whether the robot was woken up and not put back to sleep
    pub awake: bool,
    /// Number of move commands received
    pub moves: u64,
}

/// A device that pretends to move
pub struct SimulatedDevice {
    state: Arc<RwLock<SimulatedState>>,
    simulate_latency: bool,
}

impl SimulatedDevice {
    /// Create a simulated device
    ///
    /// With `simulate_latency` every move blocks for its duration hint.
    #[must_use]
    pub fn new(simulate_latency: bool) -> Self {
        Self {
            state: Arc::new(RwLock::new(SimulatedState::default())),
            simulate_latency,
        }
    }

    /// Shared handle to the simulated state
    #[must_use]
    pub fn state(&self) -> Arc<RwLock<SimulatedState>> {
        Arc::clone(&self.state)
    }
}

impl RobotDevice for SimulatedDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    fn goto_target(&mut self, command: &MoveCommand) -> Result<(), DeviceError> {
        debug!(command = %command, "Simulated move");

        if self.simulate_latency {
            std::thread::sleep(command.duration());
        }

        let mut state = self.state.write();
        if let Some(head) = command.head() {
            state.head = head.orientation();
        }
        if let Some(antennas) = command.antennas() {
            state.antennas = antennas;
        }
        state.moves += 1;
        Ok(())
    }

    fn wake_up(&mut self) -> Result<(), DeviceError> {
        debug!("Simulated wake up");
        let mut state = self.state.write();
        state.awake = true;
        state.head = Orientation::CENTER;
        state.antennas = AntennaState::NEUTRAL;
        Ok(())
    }

    fn goto_sleep(&mut self) -> Result<(), DeviceError> {
        debug!("Simulated sleep");
        self.state.write().awake = false;
        Ok(())
    }
}
