//! Recording Device
//!
//! A [`RobotDevice`] that remembers every call it receives, for tests.
//!
//! # Usage
//!
//! ```ignore
//! use motion_core::device::recording::RecordingDevice;
//!
//! let device = RecordingDevice::new().failing_on([1]);
//! let log = device.log();
//!
//! // hand `device` to a DeviceAdapter, run commands...
//!
//! assert_eq!(log.moves().len(), 3);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::traits::{DeviceError, MoveCommand, RobotDevice};

/// One call received by a [`RecordingDevice`]
#[derive(Clone, Debug)]
pub enum RecordedCall {
    /// `goto_target`
    Move {
        /// The command as received
        command: MoveCommand,
        /// When the call started
        started: Instant,
        /// When the call returned
        finished: Instant,
        /// Whether the call was made to fail
        failed: bool,
    },
    /// `wake_up`
    WakeUp {
        /// When the call started
        started: Instant,
    },
    /// `goto_sleep`
    Sleep {
        /// When the call started
        started: Instant,
    },
}

impl RecordedCall {
    /// When the call started
    #[must_use]
    pub fn started(&self) -> Instant {
        match self {
            Self::Move { started, .. } | Self::WakeUp { started } | Self::Sleep { started } => {
                *started
            }
        }
    }
}

#[derive(Default)]
struct LogInner {
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Shared view of everything a [`RecordingDevice`] received
#[derive(Clone, Default)]
pub struct CallLog {
    inner: Arc<LogInner>,
}

impl CallLog {
    /// All calls in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().clone()
    }

    /// Move commands in arrival order, failed ones included
    #[must_use]
    pub fn moves(&self) -> Vec<MoveCommand> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Move { command, .. } => Some(*command),
                _ => None,
            })
            .collect()
    }

    /// Number of calls received
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// Whether no call was received
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest number of calls that were executing at the same time
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn push(&self, call: RecordedCall) {
        self.inner.calls.lock().push(call);
    }
}

/// Test device that records calls and fails on request
pub struct RecordingDevice {
    log: CallLog,
    fail_on: HashSet<usize>,
    fail_all: bool,
    latency: Duration,
    next_index: usize,
}

impl RecordingDevice {
    /// A device that succeeds instantly
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            fail_on: HashSet::new(),
            fail_all: false,
            latency: Duration::ZERO,
            next_index: 0,
        }
    }

    /// Fail the calls with these zero-based indices
    #[must_use]
    pub fn failing_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.fail_on.extend(indices);
        self
    }

    /// Fail every call, as if the robot were unplugged
    #[must_use]
    pub fn unplugged(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Block for this long inside every call
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle to the call log, usable after the device moved to a worker
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn should_fail(&mut self) -> bool {
        let index = self.next_index;
        self.next_index += 1;
        self.fail_all || self.fail_on.contains(&index)
    }

    fn simulate_work(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotDevice for RecordingDevice {
    fn name(&self) -> &str {
        "recording"
    }

    fn goto_target(&mut self, command: &MoveCommand) -> Result<(), DeviceError> {
        self.log.enter();
        let started = Instant::now();
        let failed = self.should_fail();
        self.simulate_work();
        self.log.push(RecordedCall::Move {
            command: *command,
            started,
            finished: Instant::now(),
            failed,
        });
        self.log.exit();

        if failed {
            Err(DeviceError::Actuator("injected failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn wake_up(&mut self) -> Result<(), DeviceError> {
        let failed = self.should_fail();
        self.log.push(RecordedCall::WakeUp {
            started: Instant::now(),
        });
        if failed {
            Err(DeviceError::Transport("robot not reachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn goto_sleep(&mut self) -> Result<(), DeviceError> {
        let failed = self.should_fail();
        self.log.push(RecordedCall::Sleep {
            started: Instant::now(),
        });
        if failed {
            Err(DeviceError::Transport("robot not reachable".to_string()))
        } else {
            Ok(())
        }
    }
}
