//! Motion Test Utilities
//!
//! An async [`Actuator`] that lives entirely on the tokio clock, so tests can
//! run choreographies under `#[tokio::test(start_paused = true)]` without a
//! worker thread.
//!
//! # Usage
//!
//! ```ignore
//! use motion_core::test_utils::MockActuator;
//!
//! let actuator = Arc::new(MockActuator::new().failing_on([1]));
//! let controller = MotionController::new(actuator.clone(), MotionSettings::default());
//!
//! controller.nod_yes(Some(1)).await;
//! assert_eq!(actuator.moves().len(), 3);
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::device::{Actuator, DeviceError, MoveCommand, MoveOutcome};
use crate::sequencer::StopSignal;

/// Lifecycle calls seen by a [`MockActuator`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// `wake_up`
    WakeUp,
    /// `goto_sleep`
    Sleep,
}

#[derive(Default)]
struct MockState {
    moves: Vec<(MoveCommand, Instant)>,
    lifecycle: Vec<Lifecycle>,
}

/// Actuator double that waits out each move on the tokio clock
#[derive(Default)]
pub struct MockActuator {
    state: Mutex<MockState>,
    fail_on: HashSet<usize>,
    unavailable: bool,
    raise_on: Option<(usize, StopSignal)>,
}

impl MockActuator {
    /// An actuator where every call succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the moves with these zero-based indices
    #[must_use]
    pub fn failing_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on.extend(indices);
        self
    }

    /// Fail every call with a transport error
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Raise `stop` once move `index` has completed
    #[must_use]
    pub fn raising_on(mut self, index: usize, stop: StopSignal) -> Self {
        self.raise_on = Some((index, stop));
        self
    }

    /// Moves received, with the tokio instant each one arrived
    #[must_use]
    pub fn timed_moves(&self) -> Vec<(MoveCommand, Instant)> {
        self.state.lock().moves.clone()
    }

    /// Moves received, in order
    #[must_use]
    pub fn moves(&self) -> Vec<MoveCommand> {
        self.state.lock().moves.iter().map(|(m, _)| *m).collect()
    }

    /// Lifecycle calls received, in order
    #[must_use]
    pub fn lifecycle(&self) -> Vec<Lifecycle> {
        self.state.lock().lifecycle.clone()
    }

    fn unreachable() -> MoveOutcome {
        MoveOutcome::Failed(DeviceError::Transport("robot not reachable".to_string()))
    }
}

#[async_trait]
impl Actuator for MockActuator {
    async fn move_to(&self, command: MoveCommand) -> MoveOutcome {
        let index = {
            let mut state = self.state.lock();
            state.moves.push((command, Instant::now()));
            state.moves.len() - 1
        };

        tokio::time::sleep(command.duration()).await;

        if let Some((at, stop)) = &self.raise_on {
            if *at == index {
                stop.raise();
            }
        }

        if self.unavailable {
            Self::unreachable()
        } else if self.fail_on.contains(&index) {
            MoveOutcome::Failed(DeviceError::Actuator("stalled".to_string()))
        } else {
            MoveOutcome::Completed
        }
    }

    async fn wake_up(&self) -> MoveOutcome {
        self.state.lock().lifecycle.push(Lifecycle::WakeUp);
        if self.unavailable {
            Self::unreachable()
        } else {
            MoveOutcome::Completed
        }
    }

    async fn goto_sleep(&self) -> MoveOutcome {
        self.state.lock().lifecycle.push(Lifecycle::Sleep);
        if self.unavailable {
            Self::unreachable()
        } else {
            MoveOutcome::Completed
        }
    }
}
