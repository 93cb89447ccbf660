//! Expression Sequencer
//!
//! Executes a [`Choreography`] step by step against an [`Actuator`].
//!
//! # Ordering
//!
//! A step is issued only after the previous device call returned and the
//! previous step's post-delay elapsed. Steps are never skipped or reordered; a
//! failed step is counted and the next one still runs.
//!
//! # Stopping
//!
//! A [`StopSignal`] is checked before every step and raced against every
//! post-delay. Once raised no further step is issued. A device call that is
//! already in flight is always allowed to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::choreography::Choreography;
use crate::device::{Actuator, MoveCommand, MoveOutcome};

#[derive(Debug, Default)]
struct StopInner {
    raised: AtomicBool,
    notify: Notify,
}

/// Cooperative stop request shared between a run and whoever may cancel it
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    /// A signal that has not been raised
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop before its next step
    pub fn raise(&self) {
        self.inner.raised.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether a stop was requested
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Resolve once the signal is raised
    pub async fn raised(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_raised() {
            return;
        }
        notified.await;
    }
}

/// What happened during one choreography run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceReport {
    /// Choreography name
    pub name: String,
    /// Steps in the choreography
    pub total: usize,
    /// Steps handed to the actuator
    pub issued: usize,
    /// Issued steps that failed or timed out
    pub failed: usize,
    /// Whether the run ended early on a stop request
    pub stopped: bool,
}

impl SequenceReport {
    /// Whether every step ran and none failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.stopped && self.failed == 0 && self.issued == self.total
    }
}

/// Run `choreography` to completion or until `stop` is raised
pub async fn run(
    actuator: &dyn Actuator,
    choreography: &Choreography,
    stop: &StopSignal,
) -> SequenceReport {
    let span = tracing::info_span!(
        "choreography",
        name = choreography.name(),
        run_id = %Uuid::new_v4()
    );

    execute(actuator, choreography, stop).instrument(span).await
}

async fn execute(
    actuator: &dyn Actuator,
    choreography: &Choreography,
    stop: &StopSignal,
) -> SequenceReport {
    let mut report = SequenceReport {
        name: choreography.name().to_string(),
        total: choreography.len(),
        issued: 0,
        failed: 0,
        stopped: false,
    };

    for (index, step) in choreography.steps().iter().enumerate() {
        if stop.is_raised() {
            report.stopped = true;
            break;
        }

        let command = MoveCommand::from_step(step);
        debug!(step = index, command = %command, "Issuing step");
        report.issued += 1;

        match actuator.move_to(command).await {
            MoveOutcome::Completed => {}
            MoveOutcome::Failed(e) => {
                warn!(step = index, error = %e, "Step failed, continuing");
                report.failed += 1;
            }
            MoveOutcome::TimedOut => {
                warn!(step = index, "Step timed out, continuing");
                report.failed += 1;
            }
        }

        if step.post_delay.is_zero() {
            continue;
        }

        tokio::select! {
            () = tokio::time::sleep(step.post_delay) => {}
            () = stop.raised() => {
                report.stopped = true;
                break;
            }
        }
    }

    if report.stopped {
        info!(
            issued = report.issued,
            total = report.total,
            "Choreography stopped early"
        );
    } else {
        debug!(failed = report.failed, "Choreography finished");
    }

    report
}
