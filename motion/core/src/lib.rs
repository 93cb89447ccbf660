//! Motion Core - Expressive Motion for a Desktop Robot
//!
//! Turns semantic requests ("look left", "express happy", "nod yes") into
//! time-ordered, bounded actuator targets for a robot head with two antennas,
//! and runs them without blocking the caller's async runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                   Conversational layer / daemon                  │
//! │               tools::dispatch("nod_yes", {times: 3})             │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                          MOTION CORE                             │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │                    MotionController                        │  │
//! │  │      motion lock · busy policy · status strings            │  │
//! │  └──────┬──────────────────────────────────────────┬──────────┘  │
//! │         │ gestures / choreography tables           │             │
//! │  ┌──────┴──────┐   ┌──────────┐   ┌──────────┐   ┌─┴──────────┐  │
//! │  │  Sequencer  ├──►│  Safety  ├──►│   Pose   ├──►│ MoveCommand│  │
//! │  │ (StopSignal)│   │  Clamp   │   │ Builder  │   └─┬──────────┘  │
//! │  └─────────────┘   └──────────┘   └──────────┘     │             │
//! │                                                    │ mpsc        │
//! │  ┌─────────────────────────────────────────────────┴──────────┐  │
//! │  │        DeviceAdapter (dedicated actuator thread)           │  │
//! │  └─────────────────────────────┬──────────────────────────────┘  │
//! └────────────────────────────────┼─────────────────────────────────┘
//!                                  │ RobotDevice (sync)
//!                          ┌───────┴────────┐
//!                          │  motor driver  │
//!                          └────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`MotionController`]: the command facade; every operation returns a
//!   status string
//! - [`RobotDevice`]: the synchronous driver seam
//! - [`DeviceAdapter`]: runs a [`RobotDevice`] on its own thread
//! - [`Choreography`]: an ordered, non-empty list of [`MotionStep`]s
//!
//! # Quick Start
//!
//! ```ignore
//! use motion_core::{load_config, MotionController, SimulatedDevice};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let device = SimulatedDevice::new(config.simulate_latency);
//!     let controller = MotionController::spawn(device, &config)?;
//!
//!     println!("{}", controller.express_emotion("happy").await);
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`pose`]: orientations, antenna states and head poses
//! - [`safety`]: actuator limits and the clamp
//! - [`device`]: device traits, the actuator worker, simulated and recording devices
//! - [`gestures`]: single-step presets and name resolution
//! - [`choreography`]: emotion, gesture and dance step tables
//! - [`sequencer`]: ordered execution with cooperative stop
//! - [`controller`]: the command facade
//! - [`tools`]: tool declarations and call dispatch
//! - [`config`]: TOML and environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod choreography;
pub mod config;
pub mod controller;
pub mod device;
pub mod gestures;
pub mod pose;
pub mod safety;
pub mod sequencer;
pub mod test_utils;
pub mod tools;

// Re-exports for convenience
pub use choreography::{Choreography, DanceStyle, Emotion, MotionStep};
pub use controller::{MotionController, SHUT_DOWN_MESSAGE};
pub use device::{
    Actuator, AdapterConfig, DeviceAdapter, DeviceError, MoveCommand, MoveOutcome,
    RecordingDevice, RobotDevice, SimulatedDevice,
};
pub use gestures::{resolve, AntennaExpression, HeadDirection, NamedVariant, Resolved, TiltSide};
pub use pose::{build_head_pose, AngleUnit, AntennaState, HeadPose, Orientation};
pub use sequencer::{SequenceReport, StopSignal};
pub use tools::{declarations, dispatch, ToolCall, ToolError};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_file, load_config_from_path, BusyPolicy,
    ConfigError, ConfigOverrides, ConfigSource, MotionConfigFile, MotionSettings,
};
