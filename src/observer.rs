//! Pool event reporting
//!
//! The pool never logs through a global on its own. Every notable step is
//! handed to a [`PoolObserver`] chosen at construction; [`LogObserver`]
//! forwards events to the `log` facade and is what you get by default.

use crate::core::{FailureKind, JobId, Priority};
use crate::pool::WorkerExit;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

/// Identity of the job an event is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    /// Job identifier
    pub id: JobId,
    /// Job name
    pub name: String,
    /// Job priority
    pub priority: Priority,
    /// Wall-clock time the pool accepted the job
    pub submitted_at: DateTime<Utc>,
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, submitted {})",
            self.name,
            self.id,
            self.priority,
            self.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Something that happened inside the pool
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// A worker thread entered its loop
    WorkerStarted {
        /// Worker id
        worker_id: usize,
    },
    /// A worker thread left its loop
    WorkerStopped {
        /// Worker id
        worker_id: usize,
        /// Why it left
        reason: WorkerExit,
    },
    /// An attempt returned success; the job is done
    AttemptSucceeded {
        /// Worker that ran the attempt
        worker_id: usize,
        /// The job
        job: JobRef,
        /// 1-based attempt number
        attempt: u32,
        /// Time spent in the task body
        elapsed: Duration,
    },
    /// An attempt failed
    AttemptFailed {
        /// Worker that ran the attempt
        worker_id: usize,
        /// The job
        job: JobRef,
        /// 1-based attempt number
        attempt: u32,
        /// Attempt budget of the job
        max_attempts: u32,
        /// How the attempt failed
        kind: FailureKind,
        /// Rendered failure
        error: String,
        /// Whether another attempt follows
        will_retry: bool,
        /// Wait before the next attempt, when there is one
        retry_in: Option<Duration>,
    },
    /// The attempt budget ran out; the job is dropped
    PermanentFailure {
        /// Worker that ran the last attempt
        worker_id: usize,
        /// The job
        job: JobRef,
        /// Attempts made
        attempts: u32,
        /// Rendered failure of the last attempt
        error: String,
    },
    /// `scale_to` changed the intended worker count
    Scaled {
        /// Previous target
        from: usize,
        /// New target
        to: usize,
    },
    /// Queued jobs were dropped at stop without running
    JobsDiscarded {
        /// Number of jobs dropped
        count: usize,
    },
    /// Every worker has exited
    PoolStopped,
}

/// Receiver of pool events
///
/// Called from worker threads and from the thread driving the controller,
/// never while the pool's internal lock is held.
pub trait PoolObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &PoolEvent);
}

/// Writes events through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PoolObserver for LogObserver {
    fn on_event(&self, event: &PoolEvent) {
        match event {
            PoolEvent::WorkerStarted { worker_id } => {
                log::debug!("worker #{} started", worker_id);
            }
            PoolEvent::WorkerStopped { worker_id, reason } => {
                log::debug!("worker #{} stopped ({})", worker_id, reason);
            }
            PoolEvent::AttemptSucceeded {
                job,
                attempt,
                elapsed,
                ..
            } => {
                log::info!(
                    "job {} succeeded on attempt {} in {:?}",
                    job,
                    attempt,
                    elapsed
                );
            }
            PoolEvent::AttemptFailed {
                job,
                attempt,
                max_attempts,
                kind,
                error,
                retry_in,
                ..
            } => {
                let next = match retry_in {
                    Some(delay) => format!("retrying in {:?}", delay),
                    None => "no attempts left".to_string(),
                };
                match kind {
                    FailureKind::Panic => log::error!(
                        "job {} panicked on attempt {}/{}: {}; {}",
                        job,
                        attempt,
                        max_attempts,
                        error,
                        next
                    ),
                    FailureKind::DeadlineExceeded | FailureKind::Error => log::warn!(
                        "job {} failed on attempt {}/{}: {}; {}",
                        job,
                        attempt,
                        max_attempts,
                        error,
                        next
                    ),
                }
            }
            PoolEvent::PermanentFailure {
                job,
                attempts,
                error,
                ..
            } => {
                log::error!(
                    "job {} permanently failed after {} attempts: {}",
                    job,
                    attempts,
                    error
                );
            }
            PoolEvent::Scaled { from, to } => {
                log::info!("worker pool scaled from {} to {} workers", from, to);
            }
            PoolEvent::JobsDiscarded { count } => {
                log::warn!("{} queued jobs discarded at shutdown", count);
            }
            PoolEvent::PoolStopped => {
                log::info!("worker pool stopped");
            }
        }
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PoolObserver for NoopObserver {
    fn on_event(&self, _event: &PoolEvent) {}
}
