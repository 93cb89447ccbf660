//! Device Adapter
//!
//! Runs a synchronous [`RobotDevice`] on its own thread so that slow motor
//! calls never block the async runtime.
//!
//! # Architecture
//!
//! ```text
//!   async callers                       actuator thread
//!  ┌──────────────┐   mpsc<Request>   ┌──────────────────┐
//!  │ DeviceAdapter├──────────────────►│ loop {           │
//!  │  move_to()   │                   │   device.call()  │
//!  │   .await ◄───┼───────────────────┤   reply.send()   │
//!  └──────────────┘   oneshot<Result> │ }                │
//!                                     └──────────────────┘
//! ```
//!
//! The device lives on exactly one thread and requests are served in arrival
//! order, so there is never more than one device call in flight.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::traits::{Actuator, DeviceError, MoveCommand, MoveOutcome, RobotDevice};

/// Adapter configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Requests that may wait for the worker before senders back off
    pub queue_capacity: usize,
    /// How long to wait past a call's nominal duration before giving up.
    /// `None` waits indefinitely.
    pub settle_timeout: Option<Duration>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            settle_timeout: None,
        }
    }
}

/// Operation executed on the worker
#[derive(Clone, Copy, Debug)]
enum DeviceOp {
    Move(MoveCommand),
    WakeUp,
    Sleep,
}

impl DeviceOp {
    fn label(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::WakeUp => "wake_up",
            Self::Sleep => "goto_sleep",
        }
    }

    fn nominal_duration(&self) -> Duration {
        match self {
            Self::Move(command) => command.duration(),
            Self::WakeUp | Self::Sleep => Duration::ZERO,
        }
    }
}

struct Request {
    op: DeviceOp,
    reply: oneshot::Sender<Result<(), DeviceError>>,
}

/// Async handle to a device running on a dedicated thread
pub struct DeviceAdapter {
    device_name: String,
    tx: Mutex<Option<mpsc::Sender<Request>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    settle_timeout: Option<Duration>,
}

impl DeviceAdapter {
    /// Move `device` onto a new actuator thread
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Spawn`] if the thread cannot be created.
    pub fn spawn<D: RobotDevice>(device: D, config: &AdapterConfig) -> Result<Self, DeviceError> {
        let device_name = device.name().to_string();
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let worker = std::thread::Builder::new()
            .name("actuator".to_string())
            .spawn(move || run_worker(device, rx))
            .map_err(|e| DeviceError::Spawn(e.to_string()))?;

        info!(device = %device_name, "Actuator worker started");

        Ok(Self {
            device_name,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            settle_timeout: config.settle_timeout,
        })
    }

    /// Name of the wrapped device
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Whether the adapter still accepts requests
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tx.lock().is_some()
    }

    /// Stop accepting requests and wait for the worker to drain and exit
    ///
    /// Requests already queued still run. Safe to call more than once.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().take());

        let Some(handle) = self.worker.lock().take() else {
            return;
        };

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(())) => info!(device = %self.device_name, "Actuator worker stopped"),
            Ok(Err(_)) => error!(device = %self.device_name, "Actuator worker panicked"),
            Err(e) => error!(error = %e, "Failed to join actuator worker"),
        }
    }

    async fn dispatch(&self, op: DeviceOp) -> MoveOutcome {
        let label = op.label();
        let sender = self.tx.lock().clone();
        let Some(sender) = sender else {
            warn!(op = label, "Actuator worker already shut down");
            return MoveOutcome::Failed(DeviceError::Disconnected);
        };

        let (reply, completion) = oneshot::channel();
        if sender.send(Request { op, reply }).await.is_err() {
            error!(op = label, "Actuator worker is gone");
            return MoveOutcome::Failed(DeviceError::Disconnected);
        }

        let result = match self.settle_timeout {
            Some(settle) => {
                let limit = op.nominal_duration() + settle;
                match tokio::time::timeout(limit, completion).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            op = label,
                            limit_ms = limit.as_millis() as u64,
                            "Device call did not complete in time"
                        );
                        return MoveOutcome::TimedOut;
                    }
                }
            }
            None => completion.await,
        };

        match result {
            Ok(Ok(())) => MoveOutcome::Completed,
            Ok(Err(e)) => {
                error!(op = label, error = %e, "Motion error");
                MoveOutcome::Failed(e)
            }
            Err(_) => {
                error!(op = label, "Actuator worker dropped the request");
                MoveOutcome::Failed(DeviceError::Disconnected)
            }
        }
    }
}

#[async_trait]
impl Actuator for DeviceAdapter {
    async fn move_to(&self, command: MoveCommand) -> MoveOutcome {
        self.dispatch(DeviceOp::Move(command)).await
    }

    async fn wake_up(&self) -> MoveOutcome {
        self.dispatch(DeviceOp::WakeUp).await
    }

    async fn goto_sleep(&self) -> MoveOutcome {
        self.dispatch(DeviceOp::Sleep).await
    }
}

impl std::fmt::Debug for DeviceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAdapter")
            .field("device_name", &self.device_name)
            .field("running", &self.is_running())
            .field("settle_timeout", &self.settle_timeout)
            .finish()
    }
}

fn run_worker<D: RobotDevice>(mut device: D, mut rx: mpsc::Receiver<Request>) {
    while let Some(Request { op, reply }) = rx.blocking_recv() {
        debug!(op = op.label(), "Executing device call");

        let result = catch_unwind(AssertUnwindSafe(|| match op {
            DeviceOp::Move(command) => device.goto_target(&command),
            DeviceOp::WakeUp => device.wake_up(),
            DeviceOp::Sleep => device.goto_sleep(),
        }))
        .unwrap_or_else(|payload| Err(DeviceError::Panicked(panic_message(payload.as_ref()))));

        // The caller may have timed out and gone away
        let _ = reply.send(result);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choreography::MotionStep;
    use crate::device::recording::{RecordedCall, RecordingDevice};
    use crate::pose::Orientation;

    fn command(yaw: f32) -> MoveCommand {
        MoveCommand::from_step(&MotionStep::head(
            Orientation::yaw(yaw),
            Duration::from_millis(10),
        ))
    }

    struct PanickingDevice;

    impl RobotDevice for PanickingDevice {
        fn name(&self) -> &str {
            "panicking"
        }

        fn goto_target(&mut self, _command: &MoveCommand) -> Result<(), DeviceError> {
            panic!("servo bus exploded");
        }

        fn wake_up(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        fn goto_sleep(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_move_reaches_device() {
        let device = RecordingDevice::new();
        let log = device.log();
        let adapter = DeviceAdapter::spawn(device, &AdapterConfig::default()).unwrap();
        assert_eq!(adapter.device_name(), "recording");

        assert_eq!(adapter.move_to(command(10.0)).await, MoveOutcome::Completed);
        assert_eq!(adapter.wake_up().await, MoveOutcome::Completed);

        let calls = log.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], RecordedCall::Move { .. }));
        assert!(matches!(calls[1], RecordedCall::WakeUp { .. }));

        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_device_error_becomes_outcome() {
        let device = RecordingDevice::new().failing_on([0]);
        let adapter = DeviceAdapter::spawn(device, &AdapterConfig::default()).unwrap();

        let outcome = adapter.move_to(command(10.0)).await;
        assert!(matches!(outcome, MoveOutcome::Failed(DeviceError::Actuator(_))));

        // The worker keeps serving after a failure
        assert_eq!(adapter.move_to(command(5.0)).await, MoveOutcome::Completed);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let adapter = DeviceAdapter::spawn(PanickingDevice, &AdapterConfig::default()).unwrap();

        let outcome = adapter.move_to(command(0.0)).await;
        assert_eq!(
            outcome,
            MoveOutcome::Failed(DeviceError::Panicked("servo bus exploded".to_string()))
        );
        assert_eq!(adapter.wake_up().await, MoveOutcome::Completed);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let adapter =
            DeviceAdapter::spawn(RecordingDevice::new(), &AdapterConfig::default()).unwrap();
        adapter.shutdown().await;
        adapter.shutdown().await;

        assert!(!adapter.is_running());
        assert_eq!(
            adapter.goto_sleep().await,
            MoveOutcome::Failed(DeviceError::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_settle_timeout() {
        let device = RecordingDevice::new().with_latency(Duration::from_millis(300));
        let config = AdapterConfig {
            settle_timeout: Some(Duration::from_millis(20)),
            ..AdapterConfig::default()
        };
        let adapter = DeviceAdapter::spawn(device, &config).unwrap();

        assert_eq!(adapter.move_to(command(0.0)).await, MoveOutcome::TimedOut);
        adapter.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_overlap() {
        let device = RecordingDevice::new().with_latency(Duration::from_millis(5));
        let log = device.log();
        let adapter =
            std::sync::Arc::new(DeviceAdapter::spawn(device, &AdapterConfig::default()).unwrap());

        let mut handles = Vec::new();
        for i in 0..8 {
            let adapter = adapter.clone();
            handles.push(tokio::spawn(async move {
                adapter.move_to(command(i as f32)).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), MoveOutcome::Completed);
        }

        assert_eq!(log.len(), 8);
        assert_eq!(log.max_in_flight(), 1);
        adapter.shutdown().await;
    }
}
