//! Device Layer
//!
//! Everything between a clamped [`MoveCommand`] and the motors.
//!
//! - [`traits`]: the synchronous [`RobotDevice`] seam and the async [`Actuator`]
//! - [`adapter`]: [`DeviceAdapter`], the dedicated actuator thread
//! - [`simulated`]: [`SimulatedDevice`] for running without hardware
//! - [`recording`]: [`RecordingDevice`] for tests

pub mod adapter;
pub mod recording;
pub mod simulated;
pub mod traits;

pub use adapter::{AdapterConfig, DeviceAdapter};
pub use recording::{CallLog, RecordedCall, RecordingDevice};
pub use simulated::{SimulatedDevice, SimulatedState};
pub use traits::{Actuator, DeviceError, MoveCommand, MoveOutcome, RobotDevice};
