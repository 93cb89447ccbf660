//! Safety Clamp
//!
//! Bounds enforcement for every value that reaches the actuators or shapes how
//! long they move.
//!
//! # Design Philosophy
//!
//! Commands come from an LLM tool call, so any number can show up. Nothing in
//! here rejects input: out-of-range values saturate to the nearest bound and
//! the command still runs.
//!
//! | axis | range |
//! |---|---|
//! | head roll | [-30°, 30°] |
//! | head pitch | [-30°, 30°] |
//! | head yaw | [-45°, 45°] |
//! | antenna (semantic) | [-90°, 90°] |
//! | antenna (device) | [-1.57, 1.57] rad |

use std::time::Duration;

/// Saturate `value` into `[min, max]`
///
/// `max(min, min(max, value))`. NaN saturates to 0 brought into range, so the
/// result is always inside the bounds.
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0_f32.max(min).min(max);
    }
    value.min(max).max(min)
}

/// Closed range for a floating point quantity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    /// Lower bound (inclusive)
    pub min: f32,
    /// Upper bound (inclusive)
    pub max: f32,
}

impl Bound {
    /// Create a bound
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Saturate a value into this bound
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        clamp(value, self.min, self.max)
    }

    /// Whether a value lies inside this bound
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Closed range for a repeat count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountBound {
    /// Lower bound (inclusive)
    pub min: u32,
    /// Upper bound (inclusive)
    pub max: u32,
}

impl CountBound {
    /// Create a bound
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Saturate a signed count into this bound
    #[must_use]
    pub fn clamp(&self, value: i64) -> u32 {
        let clamped = value.clamp(i64::from(self.min), i64::from(self.max));
        u32::try_from(clamped).unwrap_or(self.min)
    }
}

/// Head roll (degrees)
pub const HEAD_ROLL: Bound = Bound::new(-30.0, 30.0);
/// Head pitch (degrees)
pub const HEAD_PITCH: Bound = Bound::new(-30.0, 30.0);
/// Head yaw (degrees)
pub const HEAD_YAW: Bound = Bound::new(-45.0, 45.0);
/// Antenna angle as the command layer speaks it (degrees)
pub const ANTENNA_DEGREES: Bound = Bound::new(-90.0, 90.0);
/// Antenna angle as the motors take it (radians)
pub const ANTENNA_RADIANS: Bound = Bound::new(-1.57, 1.57);

/// Duration of a single commanded move (seconds)
pub const MOVE_DURATION_SECS: Bound = Bound::new(0.1, 3.0);
/// Head tilt magnitude (degrees)
pub const TILT_ANGLE: Bound = Bound::new(5.0, 30.0);
/// Nod repetitions
pub const NOD_TIMES: CountBound = CountBound::new(1, 5);
/// Shake repetitions
pub const SHAKE_TIMES: CountBound = CountBound::new(1, 5);

/// Saturate a requested move duration and convert it
#[must_use]
pub fn move_duration(secs: f32) -> Duration {
    Duration::from_secs_f32(MOVE_DURATION_SECS.clamp(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_inside_range_is_identity() {
        assert_eq!(clamp(12.5, -30.0, 30.0), 12.5);
    }

    #[test]
    fn test_clamp_saturates() {
        assert_eq!(HEAD_ROLL.clamp(50.0), 30.0);
        assert_eq!(HEAD_YAW.clamp(-90.0), -45.0);
        assert_eq!(ANTENNA_RADIANS.clamp(2.0), 1.57);
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(HEAD_PITCH.clamp(f32::NAN), 0.0);
        assert_eq!(HEAD_PITCH.clamp(f32::INFINITY), 30.0);
        assert_eq!(HEAD_PITCH.clamp(f32::NEG_INFINITY), -30.0);
        // NaN lands on the nearest bound when 0 is outside the range
        assert_eq!(TILT_ANGLE.clamp(f32::NAN), 5.0);
    }

    #[test]
    fn test_count_bound() {
        assert_eq!(NOD_TIMES.clamp(10), 5);
        assert_eq!(NOD_TIMES.clamp(0), 1);
        assert_eq!(NOD_TIMES.clamp(-3), 1);
        assert_eq!(SHAKE_TIMES.clamp(3), 3);
    }

    #[test]
    fn test_move_duration() {
        assert_eq!(move_duration(10.0), Duration::from_secs(3));
        assert_eq!(move_duration(0.5), Duration::from_millis(500));
        assert!((move_duration(-1.0).as_secs_f32() - 0.1).abs() < 1e-6);
    }

    fn all_bounds() -> [Bound; 7] {
        [
            HEAD_ROLL,
            HEAD_PITCH,
            HEAD_YAW,
            ANTENNA_DEGREES,
            ANTENNA_RADIANS,
            MOVE_DURATION_SECS,
            TILT_ANGLE,
        ]
    }

    proptest! {
        #[test]
        fn clamp_stays_within_bounds(value in proptest::num::f32::ANY) {
            for bound in all_bounds() {
                prop_assert!(bound.contains(bound.clamp(value)));
            }
        }

        #[test]
        fn clamp_is_idempotent(value in proptest::num::f32::ANY) {
            for bound in all_bounds() {
                let once = bound.clamp(value);
                prop_assert_eq!(bound.clamp(once), once);
            }
        }

        #[test]
        fn in_range_values_are_untouched(value in -30.0f32..=30.0) {
            prop_assert_eq!(HEAD_ROLL.clamp(value), value);
        }
    }
}
