//! Choreographies
//!
//! Multi-step expressions (emotions, nods, shakes, dances) described as data.
//! A [`Choreography`] is an ordered, non-empty list of [`MotionStep`]s; the
//! [`crate::sequencer`] runs it.
//!
//! Tables here are static configuration. Nothing in this module touches the
//! device or the clock.
//!
//! Gestures that oscillate (nod, shake, dance) finish with an explicit
//! center step. Single-shot emotions stay in their final expressive pose.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gestures::NamedVariant;
use crate::pose::{AntennaState, Orientation};
use crate::safety;

/// Shortest duration a step may request
pub const MIN_STEP_DURATION: Duration = Duration::from_millis(1);

const fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// One step of a choreography
///
/// Unset targets leave the corresponding actuator where it is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    /// Head target (degrees, unclamped)
    pub orientation: Option<Orientation>,
    /// Antenna target (radians, unclamped)
    pub antennas: Option<AntennaState>,
    /// Duration hint handed to the device (always > 0)
    pub duration: Duration,
    /// Pause after the device call returns
    pub post_delay: Duration,
}

impl MotionStep {
    fn new(
        orientation: Option<Orientation>,
        antennas: Option<AntennaState>,
        duration: Duration,
    ) -> Self {
        Self {
            orientation,
            antennas,
            duration: duration.max(MIN_STEP_DURATION),
            post_delay: Duration::ZERO,
        }
    }

    /// Move only the head
    #[must_use]
    pub fn head(orientation: Orientation, duration: Duration) -> Self {
        Self::new(Some(orientation), None, duration)
    }

    /// Move only the antennas
    #[must_use]
    pub fn antennas(antennas: AntennaState, duration: Duration) -> Self {
        Self::new(None, Some(antennas), duration)
    }

    /// Move head and antennas together
    #[must_use]
    pub fn both(orientation: Orientation, antennas: AntennaState, duration: Duration) -> Self {
        Self::new(Some(orientation), Some(antennas), duration)
    }

    /// Wait this long after the move before the next step
    #[must_use]
    pub fn then_pause(mut self, post_delay: Duration) -> Self {
        self.post_delay = post_delay;
        self
    }

    /// Time this step occupies, move plus pause
    #[must_use]
    pub fn span(&self) -> Duration {
        self.duration + self.post_delay
    }
}

/// A named, ordered, non-empty sequence of steps
#[derive(Clone, Debug, PartialEq)]
pub struct Choreography {
    name: String,
    steps: Vec<MotionStep>,
}

impl Choreography {
    /// Create a choreography
    ///
    /// Returns `None` if `steps` is empty.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<MotionStep>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            steps,
        })
    }

    /// A choreography made of one step
    #[must_use]
    pub fn single(name: impl Into<String>, step: MotionStep) -> Self {
        Self {
            name: name.into(),
            steps: vec![step],
        }
    }

    /// Choreography name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[MotionStep] {
        &self.steps
    }

    /// Number of steps (never zero)
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps (never true for a constructed choreography)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Nominal run time if every device call takes exactly its duration
    #[must_use]
    pub fn nominal_duration(&self) -> Duration {
        self.steps.iter().map(MotionStep::span).sum()
    }
}

/// Repeat a fixed pattern `times` times, then append `tail`
fn repeated(name: &str, pattern: &[MotionStep], times: u32, tail: MotionStep) -> Choreography {
    let mut steps = Vec::with_capacity(pattern.len() * times as usize + 1);
    for _ in 0..times {
        steps.extend_from_slice(pattern);
    }
    steps.push(tail);
    Choreography {
        name: name.to_string(),
        steps,
    }
}

/// Head back to center, antennas untouched
fn center_step(duration: Duration) -> MotionStep {
    MotionStep::head(Orientation::CENTER, duration)
}

/// Nod up and down `times` times (clamped to 1..=5), then center
#[must_use]
pub fn nod_yes(times: u32) -> Choreography {
    let times = safety::NOD_TIMES.clamp(i64::from(times));
    repeated(
        "nod_yes",
        &[
            MotionStep::head(Orientation::pitch(15.0), ms(150)).then_pause(ms(100)),
            MotionStep::head(Orientation::pitch(-10.0), ms(150)).then_pause(ms(100)),
        ],
        times,
        center_step(ms(200)),
    )
}

/// Shake left and right `times` times (clamped to 1..=5), then center
#[must_use]
pub fn shake_no(times: u32) -> Choreography {
    let times = safety::SHAKE_TIMES.clamp(i64::from(times));
    repeated(
        "shake_no",
        &[
            MotionStep::head(Orientation::yaw(20.0), ms(150)).then_pause(ms(50)),
            MotionStep::head(Orientation::yaw(-20.0), ms(150)).then_pause(ms(50)),
        ],
        times,
        center_step(ms(200)),
    )
}

/// Head and antennas to neutral over half a second
#[must_use]
pub fn reset() -> Choreography {
    Choreography::single(
        "reset",
        MotionStep::both(Orientation::CENTER, AntennaState::NEUTRAL, ms(500)),
    )
}

/// Face the camera with antennas at rest
#[must_use]
pub fn look_at_camera() -> Choreography {
    Choreography::single(
        "look_at_camera",
        MotionStep::both(Orientation::CENTER, AntennaState::NEUTRAL, ms(300)),
    )
}

/// Emotions the robot can express
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emotion {
    /// Head wiggle with bouncing antennas
    Happy,
    /// Droop head and antennas
    Sad,
    /// Quick look up with antennas popping
    Surprised,
    /// Tilt with one antenna raised
    Curious,
    /// Bouncy head with flicking antennas
    Excited,
    /// Slow droop and a small nod-off
    Sleepy,
    /// Alternating tilts with uneven antennas
    Confused,
    /// Stern look with a quick shake
    Angry,
    /// Gentle side to side sway
    Love,
    /// Calm centered pose, also used for unknown emotions
    Neutral,
}

impl Emotion {
    /// Every emotion, in table order
    pub const ALL: [Self; 10] = [
        Self::Happy,
        Self::Sad,
        Self::Surprised,
        Self::Curious,
        Self::Excited,
        Self::Sleepy,
        Self::Confused,
        Self::Angry,
        Self::Love,
        Self::Neutral,
    ];

    /// Step table for this emotion
    #[must_use]
    pub fn choreography(self) -> Choreography {
        let steps = match self {
            Self::Happy => vec![
                MotionStep::both(
                    Orientation::roll(15.0),
                    AntennaState::radians(0.5, -0.5),
                    ms(200),
                )
                .then_pause(ms(150)),
                MotionStep::both(
                    Orientation::roll(-15.0),
                    AntennaState::radians(-0.5, 0.5),
                    ms(200),
                )
                .then_pause(ms(150)),
                MotionStep::both(Orientation::CENTER, AntennaState::radians(0.3, -0.3), ms(200)),
            ],
            Self::Sad => vec![
                MotionStep::both(
                    Orientation::pitch(25.0),
                    AntennaState::radians(-1.2, 1.2),
                    ms(800),
                )
                .then_pause(ms(800)),
                MotionStep::both(
                    Orientation::pitch(5.0),
                    AntennaState::radians(-0.3, 0.3),
                    ms(500),
                ),
            ],
            Self::Surprised => vec![
                MotionStep::both(
                    Orientation::pitch(-20.0),
                    AntennaState::radians(1.0, -1.0),
                    ms(120),
                )
                .then_pause(ms(400)),
                MotionStep::both(Orientation::CENTER, AntennaState::radians(0.3, -0.3), ms(300)),
            ],
            Self::Curious => vec![
                MotionStep::both(
                    Orientation::new(20.0, -10.0, 0.0),
                    AntennaState::radians(0.6, 0.1),
                    ms(400),
                )
                .then_pause(ms(500)),
                MotionStep::both(Orientation::CENTER, AntennaState::NEUTRAL, ms(300)),
            ],
            Self::Excited => {
                let bounce = [
                    MotionStep::both(
                        Orientation::pitch(-10.0),
                        AntennaState::radians(0.8, -0.8),
                        ms(100),
                    )
                    .then_pause(ms(80)),
                    MotionStep::both(
                        Orientation::pitch(5.0),
                        AntennaState::radians(-0.2, 0.2),
                        ms(100),
                    )
                    .then_pause(ms(80)),
                ];
                let mut steps: Vec<MotionStep> =
                    bounce.iter().copied().cycle().take(bounce.len() * 3).collect();
                steps.push(MotionStep::both(
                    Orientation::CENTER,
                    AntennaState::radians(0.5, -0.5),
                    ms(200),
                ));
                steps
            }
            Self::Sleepy => vec![
                MotionStep::both(
                    Orientation::new(8.0, 25.0, 0.0),
                    AntennaState::radians(-1.3, 1.3),
                    ms(1200),
                )
                .then_pause(ms(500)),
                MotionStep::head(Orientation::new(8.0, 30.0, 0.0), ms(300)).then_pause(ms(300)),
                MotionStep::both(
                    Orientation::pitch(15.0),
                    AntennaState::radians(-0.8, 0.8),
                    ms(400),
                ),
            ],
            Self::Confused => vec![
                MotionStep::both(
                    Orientation::new(15.0, -5.0, 0.0),
                    AntennaState::radians(0.4, 0.6),
                    ms(300),
                )
                .then_pause(ms(300)),
                MotionStep::both(
                    Orientation::new(-15.0, -5.0, 0.0),
                    AntennaState::radians(0.6, 0.4),
                    ms(300),
                )
                .then_pause(ms(300)),
                MotionStep::both(
                    Orientation::roll(8.0),
                    AntennaState::radians(0.2, 0.4),
                    ms(250),
                ),
            ],
            Self::Angry => vec![
                MotionStep::both(
                    Orientation::pitch(10.0),
                    AntennaState::radians(0.8, -0.8),
                    ms(200),
                )
                .then_pause(ms(200)),
                MotionStep::head(Orientation::new(0.0, 10.0, 10.0), ms(100)).then_pause(ms(100)),
                MotionStep::head(Orientation::new(0.0, 10.0, -10.0), ms(100)).then_pause(ms(100)),
                MotionStep::both(
                    Orientation::pitch(5.0),
                    AntennaState::radians(0.5, -0.5),
                    ms(200),
                ),
            ],
            Self::Love => vec![
                MotionStep::both(
                    Orientation::new(12.0, -8.0, 0.0),
                    AntennaState::radians(0.4, -0.4),
                    ms(500),
                )
                .then_pause(ms(400)),
                MotionStep::both(
                    Orientation::new(-12.0, -8.0, 0.0),
                    AntennaState::radians(-0.4, 0.4),
                    ms(500),
                )
                .then_pause(ms(400)),
                MotionStep::both(Orientation::CENTER, AntennaState::radians(0.2, -0.2), ms(300)),
            ],
            Self::Neutral => vec![MotionStep::both(
                Orientation::CENTER,
                AntennaState::NEUTRAL,
                ms(300),
            )],
        };

        Choreography {
            name: self.name().to_string(),
            steps,
        }
    }
}

impl NamedVariant for Emotion {
    const KIND: &'static str = "emotion";
    const FALLBACK: Self = Self::Neutral;

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "happy" => Some(Self::Happy),
            "sad" => Some(Self::Sad),
            "surprised" => Some(Self::Surprised),
            "curious" => Some(Self::Curious),
            "excited" => Some(Self::Excited),
            "sleepy" => Some(Self::Sleepy),
            "confused" => Some(Self::Confused),
            "angry" => Some(Self::Angry),
            "love" => Some(Self::Love),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
            Self::Curious => "curious",
            Self::Excited => "excited",
            Self::Sleepy => "sleepy",
            Self::Confused => "confused",
            Self::Angry => "angry",
            Self::Love => "love",
            Self::Neutral => "neutral",
        }
    }
}

/// Dance styles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DanceStyle {
    /// Side to side sway with flapping antennas
    #[default]
    Default,
    /// Same moves as the default dance
    Happy,
    /// Exaggerated tilts and turns
    Silly,
}

impl DanceStyle {
    /// Step table for this style, ending back at neutral
    #[must_use]
    pub fn choreography(self) -> Choreography {
        let (pattern, times) = match self {
            Self::Default | Self::Happy => (
                [
                    MotionStep::both(
                        Orientation::new(15.0, -5.0, 0.0),
                        AntennaState::radians(0.6, -0.6),
                        ms(150),
                    )
                    .then_pause(ms(100)),
                    MotionStep::both(
                        Orientation::new(-15.0, -5.0, 0.0),
                        AntennaState::radians(-0.6, 0.6),
                        ms(150),
                    )
                    .then_pause(ms(100)),
                ],
                3,
            ),
            Self::Silly => (
                [
                    MotionStep::both(
                        Orientation::new(25.0, 0.0, 15.0),
                        AntennaState::radians(1.0, 0.0),
                        ms(200),
                    )
                    .then_pause(ms(150)),
                    MotionStep::both(
                        Orientation::new(-25.0, 0.0, -15.0),
                        AntennaState::radians(0.0, -1.0),
                        ms(200),
                    )
                    .then_pause(ms(150)),
                ],
                2,
            ),
        };

        repeated(
            &format!("{}_dance", self.name()),
            &pattern,
            times,
            MotionStep::both(Orientation::CENTER, AntennaState::NEUTRAL, ms(250)),
        )
    }
}

impl NamedVariant for DanceStyle {
    const KIND: &'static str = "dance style";
    const FALLBACK: Self = Self::Default;

    fn lookup(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "happy" => Some(Self::Happy),
            "silly" => Some(Self::Silly),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Happy => "happy",
            Self::Silly => "silly",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::resolve;

    #[test]
    fn test_empty_choreography_rejected() {
        assert!(Choreography::new("nothing", Vec::new()).is_none());
    }

    #[test]
    fn test_zero_duration_is_lifted() {
        let step = MotionStep::head(Orientation::CENTER, Duration::ZERO);
        assert_eq!(step.duration, MIN_STEP_DURATION);
    }

    #[test]
    fn test_nod_expansion() {
        let nod = nod_yes(3);
        // 3 oscillations of 2 steps + 1 center
        assert_eq!(nod.len(), 7);
        assert_eq!(nod.steps()[0].orientation, Some(Orientation::pitch(15.0)));
        assert_eq!(nod.steps()[1].orientation, Some(Orientation::pitch(-10.0)));
        assert_eq!(nod.steps()[6].orientation, Some(Orientation::CENTER));
        assert_eq!(nod.steps()[6].post_delay, Duration::ZERO);
    }

    #[test]
    fn test_repeat_counts_are_clamped() {
        assert_eq!(nod_yes(10).len(), 11);
        assert_eq!(nod_yes(0).len(), 3);
        assert_eq!(shake_no(99).len(), 11);
    }

    #[test]
    fn test_shake_steps() {
        let shake = shake_no(1);
        assert_eq!(shake.steps()[0].orientation, Some(Orientation::yaw(20.0)));
        assert_eq!(shake.steps()[0].post_delay, ms(50));
        assert_eq!(shake.steps()[1].orientation, Some(Orientation::yaw(-20.0)));
    }

    #[test]
    fn test_happy_ends_off_center() {
        let happy = Emotion::Happy.choreography();
        assert_eq!(happy.len(), 3);
        let last = happy.steps().last().copied().unwrap();
        assert_eq!(last.antennas, Some(AntennaState::radians(0.3, -0.3)));
        assert_eq!(last.orientation, Some(Orientation::CENTER));
    }

    #[test]
    fn test_every_emotion_is_non_empty() {
        for emotion in Emotion::ALL {
            let choreography = emotion.choreography();
            assert!(!choreography.is_empty());
            assert_eq!(choreography.name(), emotion.name());
        }
    }

    #[test]
    fn test_excited_bounces_three_times() {
        assert_eq!(Emotion::Excited.choreography().len(), 7);
    }

    #[test]
    fn test_unknown_emotion_is_neutral() {
        let resolved = resolve::<Emotion>("grumpy");
        assert_eq!(resolved.variant, Emotion::Neutral);
        assert!(resolved.fell_back);
    }

    #[test]
    fn test_dances_end_at_neutral() {
        for style in [DanceStyle::Default, DanceStyle::Happy, DanceStyle::Silly] {
            let dance = style.choreography();
            let last = dance.steps().last().copied().unwrap();
            assert_eq!(last.orientation, Some(Orientation::CENTER));
            assert_eq!(last.antennas, Some(AntennaState::NEUTRAL));
        }
        assert_eq!(DanceStyle::Default.choreography().len(), 7);
        assert_eq!(DanceStyle::Silly.choreography().len(), 5);
    }

    #[test]
    fn test_nominal_duration() {
        // 2 * (150 + 100) + 200
        assert_eq!(nod_yes(1).nominal_duration(), ms(700));
    }
}
