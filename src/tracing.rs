//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, every worker loop runs inside a
//! `worker` span and every job inside a `job_execution` span. The helpers in
//! [`metrics`] emit events with `counter.`/`gauge.`/`histogram.` prefixed
//! fields, the convention metrics layers built on `tracing` pick up.

/// Metrics recording functions for observability.
pub mod metrics {
    use crate::core::FailureKind;
    use std::time::Duration;

    /// Records a job submission event.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records the outcome of one attempt. `failure` is `None` on success.
    #[inline]
    pub fn record_attempt(duration: Duration, failure: Option<FailureKind>) {
        let duration_ms = duration.as_millis() as u64;
        match failure {
            None => tracing::trace!(
                counter.attempts_succeeded = 1,
                histogram.attempt_duration_ms = duration_ms,
                "attempt succeeded"
            ),
            Some(FailureKind::Panic) => tracing::trace!(
                counter.attempts_panicked = 1,
                histogram.attempt_duration_ms = duration_ms,
                "attempt panicked"
            ),
            Some(FailureKind::DeadlineExceeded) => tracing::trace!(
                counter.attempts_timed_out = 1,
                histogram.attempt_duration_ms = duration_ms,
                "attempt deadline exceeded"
            ),
            Some(FailureKind::Error) => tracing::trace!(
                counter.attempts_failed = 1,
                histogram.attempt_duration_ms = duration_ms,
                "attempt failed"
            ),
        }
    }

    /// Records worker picking up a job, with how long the job waited.
    #[inline]
    pub fn record_worker_busy(worker_id: usize, queue_wait: Duration) {
        tracing::trace!(
            gauge.workers_busy = 1,
            histogram.queue_wait_ms = queue_wait.as_millis() as u64,
            worker_id = worker_id,
            "worker busy"
        );
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_kind: &str) {
        tracing::info!(
            workers = num_workers,
            queue_kind = queue_kind,
            "worker pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(succeeded: u64, permanent_failures: u64, discarded: u64) {
        tracing::info!(
            jobs_succeeded = succeeded,
            jobs_failed = permanent_failures,
            jobs_discarded = discarded,
            "worker pool shutdown complete"
        );
    }
}
