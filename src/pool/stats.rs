//! Pool-wide and per-worker counters

use crate::core::FailureKind;
use crossbeam_utils::CachePadded;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Statistics for a worker thread
///
/// Entries outlive their worker so history survives scaling.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Jobs this worker took from the queue
    pub jobs_taken: AtomicU64,
    /// Attempts this worker executed
    pub attempts: AtomicU64,
    /// Attempts that failed (error, panic or deadline)
    pub failed_attempts: AtomicU64,
    /// Time spent inside task bodies (microseconds)
    pub busy_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_job_taken(&self) {
        self.jobs_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self, elapsed: Duration, failed: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_attempts.fetch_add(1, Ordering::Relaxed);
        }
        self.busy_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Get total jobs taken
    pub fn get_jobs_taken(&self) -> u64 {
        self.jobs_taken.load(Ordering::Relaxed)
    }

    /// Get total attempts
    pub fn get_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Get average time per attempt in microseconds
    pub fn get_average_attempt_time_us(&self) -> f64 {
        let total = self.busy_time_us.load(Ordering::Relaxed);
        let count = self.attempts.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    fn snapshot(&self, worker_id: usize) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            worker_id,
            jobs_taken: self.jobs_taken.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            busy_time_us: self.busy_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of one worker's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatsSnapshot {
    /// Worker id
    pub worker_id: usize,
    /// Jobs taken from the queue
    pub jobs_taken: u64,
    /// Attempts executed
    pub attempts: u64,
    /// Failed attempts
    pub failed_attempts: u64,
    /// Time inside task bodies (microseconds)
    pub busy_time_us: u64,
}

/// Pool-wide counters, updated by the controller and every worker
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: CachePadded<AtomicU64>,
    succeeded: CachePadded<AtomicU64>,
    failed_attempts: CachePadded<AtomicU64>,
    panicked: CachePadded<AtomicU64>,
    deadline_exceeded: CachePadded<AtomicU64>,
    retries: CachePadded<AtomicU64>,
    permanent_failures: CachePadded<AtomicU64>,
    discarded: CachePadded<AtomicU64>,
    workers: DashMap<usize, Arc<WorkerStats>>,
}

impl PoolStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, kind: FailureKind) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
        match kind {
            FailureKind::Panic => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
            }
            FailureKind::DeadlineExceeded => {
                self.deadline_exceeded.fetch_add(1, Ordering::Relaxed);
            }
            FailureKind::Error => {}
        }
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_permanent_failure(&self) {
        self.permanent_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Counters for `worker_id`, created on first use
    pub(crate) fn worker(&self, worker_id: usize) -> Arc<WorkerStats> {
        Arc::clone(
            self.workers
                .entry(worker_id)
                .or_insert_with(|| Arc::new(WorkerStats::new()))
                .value(),
        )
    }

    /// Jobs accepted by `submit`
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Jobs that finished with a successful attempt
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Failed attempts of any kind
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    /// Attempts that panicked
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// Attempts that ran past their deadline
    pub fn deadline_exceeded(&self) -> u64 {
        self.deadline_exceeded.load(Ordering::Relaxed)
    }

    /// Attempts that followed a failed attempt
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Jobs whose attempt budget ran out
    pub fn permanent_failures(&self) -> u64 {
        self.permanent_failures.load(Ordering::Relaxed)
    }

    /// Queued jobs dropped at stop
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Jobs that reached a terminal outcome
    pub fn finished(&self) -> u64 {
        self.succeeded() + self.permanent_failures()
    }

    /// Copy every counter
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        let mut workers: Vec<WorkerStatsSnapshot> = self
            .workers
            .iter()
            .map(|entry| entry.value().snapshot(*entry.key()))
            .collect();
        workers.sort_by_key(|w| w.worker_id);

        PoolStatsSnapshot {
            submitted: self.submitted(),
            succeeded: self.succeeded(),
            failed_attempts: self.failed_attempts(),
            panicked: self.panicked(),
            deadline_exceeded: self.deadline_exceeded(),
            retries: self.retries(),
            permanent_failures: self.permanent_failures(),
            discarded: self.discarded(),
            workers,
        }
    }
}

/// Serializable copy of [`PoolStats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatsSnapshot {
    /// Jobs accepted by `submit`
    pub submitted: u64,
    /// Jobs that finished with a successful attempt
    pub succeeded: u64,
    /// Failed attempts of any kind
    pub failed_attempts: u64,
    /// Attempts that panicked
    pub panicked: u64,
    /// Attempts that ran past their deadline
    pub deadline_exceeded: u64,
    /// Attempts that followed a failed attempt
    pub retries: u64,
    /// Jobs whose attempt budget ran out
    pub permanent_failures: u64,
    /// Queued jobs dropped at stop
    pub discarded: u64,
    /// Per-worker counters, ordered by worker id
    pub workers: Vec<WorkerStatsSnapshot>,
}
