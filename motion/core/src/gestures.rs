//! Gesture Library
//!
//! Static tables of single-step gestures: where the head goes for each named
//! direction, how the antennas sit for each named expression, and which way a
//! tilt leans.
//!
//! Every table is an enum resolved through an explicit `match`, so lookup is
//! constant time and the set of names is fixed at compile time. Names that are
//! not in a table resolve to that table's fallback variant; the fallback is
//! logged, never reported as an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::choreography::MotionStep;
use crate::pose::{AntennaState, Orientation};

/// Duration used by antenna expression presets
pub const ANTENNA_PRESET_DURATION: Duration = Duration::from_millis(300);

/// Duration of a head tilt
pub const TILT_DURATION: Duration = Duration::from_millis(400);

/// A named variant from one of the static tables
pub trait NamedVariant: Sized + Copy {
    /// Table name used in log lines ("direction", "emotion", ...)
    const KIND: &'static str;

    /// Variant used when a name is not recognized
    const FALLBACK: Self;

    /// Look a name up in the table
    fn lookup(name: &str) -> Option<Self>;

    /// Canonical name of this variant
    fn name(&self) -> &'static str;
}

/// Outcome of resolving a name against a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved<T> {
    /// Variant that will be executed
    pub variant: T,
    /// Whether the requested name was unknown and the fallback was used
    pub fell_back: bool,
}

/// Resolve a user-supplied name, falling back on unknown input
///
/// Matching ignores case and surrounding whitespace.
pub fn resolve<T: NamedVariant>(name: &str) -> Resolved<T> {
    let normalized = name.trim().to_lowercase();
    match T::lookup(&normalized) {
        Some(variant) => Resolved {
            variant,
            fell_back: false,
        },
        None => {
            tracing::warn!(
                kind = T::KIND,
                requested = %name,
                fallback = T::FALLBACK.name(),
                "Unknown {}, using fallback",
                T::KIND
            );
            Resolved {
                variant: T::FALLBACK,
                fell_back: true,
            }
        }
    }
}

/// Named head directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HeadDirection {
    /// Turn left (yaw +25°)
    Left,
    /// Turn right (yaw -25°)
    Right,
    /// Look up (pitch -20°)
    Up,
    /// Look down (pitch +20°)
    Down,
    /// Look straight ahead
    #[default]
    Center,
}

impl HeadDirection {
    /// Orientation this direction maps to
    #[must_use]
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Left => Orientation::yaw(25.0),
            Self::Right => Orientation::yaw(-25.0),
            Self::Up => Orientation::pitch(-20.0),
            Self::Down => Orientation::pitch(20.0),
            Self::Center => Orientation::CENTER,
        }
    }

    /// Single step moving the head in this direction
    #[must_use]
    pub fn step(self, duration: Duration) -> MotionStep {
        MotionStep::head(self.orientation(), duration)
    }
}

impl NamedVariant for HeadDirection {
    const KIND: &'static str = "direction";
    const FALLBACK: Self = Self::Center;

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "center" | "centre" | "front" => Some(Self::Center),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::Center => "center",
        }
    }
}

/// Antenna expression presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AntennaExpression {
    /// Both at rest
    #[default]
    Neutral,
    /// Both up and forward
    Alert,
    /// Both down
    Droopy,
    /// One up, one barely raised
    Asymmetric,
    /// Both fully up
    Perky,
}

impl AntennaExpression {
    /// Antenna angles for this expression (radians, right then left)
    #[must_use]
    pub fn antennas(self) -> AntennaState {
        match self {
            Self::Neutral => AntennaState::NEUTRAL,
            Self::Alert => AntennaState::radians(0.8, -0.8),
            Self::Droopy => AntennaState::radians(-1.0, 1.0),
            Self::Asymmetric => AntennaState::radians(0.5, 0.2),
            Self::Perky => AntennaState::radians(1.0, -1.0),
        }
    }

    /// Single step setting this expression
    #[must_use]
    pub fn step(self) -> MotionStep {
        MotionStep::antennas(self.antennas(), ANTENNA_PRESET_DURATION)
    }
}

impl NamedVariant for AntennaExpression {
    const KIND: &'static str = "antenna expression";
    const FALLBACK: Self = Self::Neutral;

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "neutral" => Some(Self::Neutral),
            "alert" => Some(Self::Alert),
            "droopy" => Some(Self::Droopy),
            "asymmetric" => Some(Self::Asymmetric),
            "perky" => Some(Self::Perky),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Alert => "alert",
            Self::Droopy => "droopy",
            Self::Asymmetric => "asymmetric",
            Self::Perky => "perky",
        }
    }
}

/// Side a head tilt leans towards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TiltSide {
    /// Positive roll
    Left,
    /// Negative roll
    #[default]
    Right,
}

impl TiltSide {
    /// Orientation for a tilt of `angle` degrees towards this side
    #[must_use]
    pub fn orientation(self, angle: f32) -> Orientation {
        match self {
            Self::Left => Orientation::roll(angle),
            Self::Right => Orientation::roll(-angle),
        }
    }

    /// Single step tilting `angle` degrees towards this side
    #[must_use]
    pub fn step(self, angle: f32) -> MotionStep {
        MotionStep::head(self.orientation(angle), TILT_DURATION)
    }
}

impl NamedVariant for TiltSide {
    const KIND: &'static str = "tilt side";
    const FALLBACK: Self = Self::Right;

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_table() {
        assert_eq!(HeadDirection::Left.orientation(), Orientation::new(0.0, 0.0, 25.0));
        assert_eq!(HeadDirection::Right.orientation(), Orientation::new(0.0, 0.0, -25.0));
        assert_eq!(HeadDirection::Up.orientation(), Orientation::new(0.0, -20.0, 0.0));
        assert_eq!(HeadDirection::Down.orientation(), Orientation::new(0.0, 20.0, 0.0));
        assert!(HeadDirection::Center.orientation().is_center());
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let resolved = resolve::<HeadDirection>("  LEFT ");
        assert_eq!(resolved.variant, HeadDirection::Left);
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let direction = resolve::<HeadDirection>("sideways");
        assert_eq!(direction.variant, HeadDirection::Center);
        assert!(direction.fell_back);

        let expression = resolve::<AntennaExpression>("nonexistent");
        assert_eq!(expression.variant, AntennaExpression::Neutral);
        assert!(expression.fell_back);

        let side = resolve::<TiltSide>("");
        assert_eq!(side.variant, TiltSide::Right);
        assert!(side.fell_back);
    }

    #[test]
    fn test_names_round_trip_through_lookup() {
        for expression in [
            AntennaExpression::Neutral,
            AntennaExpression::Alert,
            AntennaExpression::Droopy,
            AntennaExpression::Asymmetric,
            AntennaExpression::Perky,
        ] {
            assert_eq!(AntennaExpression::lookup(expression.name()), Some(expression));
        }
    }

    #[test]
    fn test_antenna_preset_step() {
        let step = AntennaExpression::Alert.step();
        assert_eq!(step.orientation, None);
        assert_eq!(step.antennas, Some(AntennaState::radians(0.8, -0.8)));
        assert_eq!(step.duration, ANTENNA_PRESET_DURATION);
    }

    #[test]
    fn test_tilt_side_sign() {
        assert_eq!(TiltSide::Left.orientation(20.0).roll, 20.0);
        assert_eq!(TiltSide::Right.orientation(20.0).roll, -20.0);
        assert_eq!(TiltSide::Left.step(10.0).duration, TILT_DURATION);
    }
}
