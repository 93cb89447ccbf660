//! Pose Builder
//!
//! Turns roll/pitch/yaw triples into head targets the device layer can consume.
//! Poses are precomputed from fixed angle triples; there is no kinematics here.
//!
//! # Conventions
//!
//! - Angles are stored in degrees on [`Orientation`] and in radians on
//!   [`AntennaState`] (the unit the antenna motors take).
//! - Rotation order is extrinsic x-y-z, i.e. `R = Rz(yaw) * Ry(pitch) * Rx(roll)`.
//!   Positive roll leans the head to its left, positive pitch looks down and
//!   positive yaw turns left.

use glam::{EulerRot, Mat4, Quat};
use serde::{Deserialize, Serialize};

use crate::safety;

/// Unit of the angles handed to [`build_head_pose`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AngleUnit {
    /// Degrees (what the command layer speaks)
    #[default]
    Degrees,
    /// Radians
    Radians,
}

impl AngleUnit {
    /// Convert a value in this unit to degrees
    #[must_use]
    pub fn to_degrees(self, value: f32) -> f32 {
        match self {
            Self::Degrees => value,
            Self::Radians => value.to_degrees(),
        }
    }
}

/// Head orientation in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Orientation {
    /// Roll in degrees. Positive = lean left
    pub roll: f32,
    /// Pitch in degrees. Positive = look down
    pub pitch: f32,
    /// Yaw in degrees. Positive = look left
    pub yaw: f32,
}

impl Orientation {
    /// The centered head
    pub const CENTER: Self = Self::new(0.0, 0.0, 0.0);

    /// Create an orientation from degrees
    #[must_use]
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Pure roll
    #[must_use]
    pub const fn roll(roll: f32) -> Self {
        Self::new(roll, 0.0, 0.0)
    }

    /// Pure pitch
    #[must_use]
    pub const fn pitch(pitch: f32) -> Self {
        Self::new(0.0, pitch, 0.0)
    }

    /// Pure yaw
    #[must_use]
    pub const fn yaw(yaw: f32) -> Self {
        Self::new(0.0, 0.0, yaw)
    }

    /// This orientation with every axis saturated to its safe range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            roll: safety::HEAD_ROLL.clamp(self.roll),
            pitch: safety::HEAD_PITCH.clamp(self.pitch),
            yaw: safety::HEAD_YAW.clamp(self.yaw),
        }
    }

    /// Whether this is the centered head
    #[must_use]
    pub fn is_center(&self) -> bool {
        *self == Self::CENTER
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "roll={}, pitch={}, yaw={}",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// Antenna angles in radians
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct AntennaState {
    /// Right antenna angle (rad)
    pub right: f32,
    /// Left antenna angle (rad)
    pub left: f32,
}

impl AntennaState {
    /// Both antennas at rest
    pub const NEUTRAL: Self = Self::radians(0.0, 0.0);

    /// Create from radians
    #[must_use]
    pub const fn radians(right: f32, left: f32) -> Self {
        Self { right, left }
    }

    /// Create from degrees
    ///
    /// Degrees are saturated to the semantic ±90° range before conversion.
    #[must_use]
    pub fn from_degrees(right: f32, left: f32) -> Self {
        Self {
            right: safety::ANTENNA_DEGREES.clamp(right).to_radians(),
            left: safety::ANTENNA_DEGREES.clamp(left).to_radians(),
        }
    }

    /// This state saturated to the device range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            right: safety::ANTENNA_RADIANS.clamp(self.right),
            left: safety::ANTENNA_RADIANS.clamp(self.left),
        }
    }
}

/// Device-ready head target
///
/// Keeps the (degree) orientation it was built from so that logs and tests can
/// talk about angles instead of matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadPose {
    orientation: Orientation,
    rotation: Quat,
}

impl HeadPose {
    /// The canonical reset target
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            orientation: Orientation::CENTER,
            rotation: Quat::IDENTITY,
        }
    }

    /// Orientation this pose was built from, in degrees
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Rotation of the head frame
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// 4x4 homogeneous transform with no translation
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Build a head pose from roll, pitch and yaw
///
/// Pure and total: any input produces a pose. All-zero input produces
/// [`HeadPose::neutral`]. No clamping happens here; see [`crate::safety`].
#[must_use]
pub fn build_head_pose(roll: f32, pitch: f32, yaw: f32, unit: AngleUnit) -> HeadPose {
    let orientation = Orientation::new(
        unit.to_degrees(roll),
        unit.to_degrees(pitch),
        unit.to_degrees(yaw),
    );
    head_pose_from(orientation)
}

/// Build a head pose from an [`Orientation`]
#[must_use]
pub fn head_pose_from(orientation: Orientation) -> HeadPose {
    if orientation.is_center() {
        return HeadPose::neutral();
    }

    let rotation = Quat::from_euler(
        EulerRot::ZYX,
        orientation.yaw.to_radians(),
        orientation.pitch.to_radians(),
        orientation.roll.to_radians(),
    );

    HeadPose {
        orientation,
        rotation,
    }
}
