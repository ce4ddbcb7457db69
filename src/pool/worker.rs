//! Worker thread implementation

use crate::core::{Job, PoolError, Result};
use crate::observer::{JobRef, PoolEvent};
use crate::pool::monitor::{Dispatch, Monitor};
use crate::pool::stats::WorkerStats;
use crate::queue::QueuedJob;
use crossbeam_channel::Sender;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// A worker thread that takes jobs from the ready queue
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread named `{prefix}-{id}`
    ///
    /// The worker sends its id on `exits` as the last thing it does, so the
    /// controller can join retired workers without blocking.
    pub(crate) fn spawn(id: usize, monitor: Arc<Monitor>, exits: Sender<usize>) -> Result<Self> {
        let name = format!("{}-{}", monitor.config.thread_name_prefix, id);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                Self::run(id, &monitor);
                // The receiver only disappears together with the pool
                let _ = exits.send(id);
            })
            .map_err(|e| PoolError::spawn_with_source(id, "Cannot create worker thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Join the worker thread
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|payload| PoolError::join(self.id, panic_message(payload.as_ref())))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(id: usize, monitor: &Monitor) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        let stats = monitor.stats.worker(id);
        monitor.notify(&PoolEvent::WorkerStarted { worker_id: id });

        let reason = loop {
            match monitor.next_job() {
                Dispatch::Run(queued) => {
                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_worker_busy(id, queued.created_at().elapsed());

                    Self::execute_with_retry(id, queued, monitor, &stats);

                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_worker_idle(id);
                }
                Dispatch::Exit(reason) => break reason,
            }
        };

        #[cfg(feature = "tracing")]
        debug!(
            jobs_taken = stats.get_jobs_taken(),
            attempts = stats.get_attempts(),
            reason = %reason,
            "worker shutting down"
        );

        monitor.notify(&PoolEvent::WorkerStopped {
            worker_id: id,
            reason,
        });
    }

    /// Run a job until an attempt succeeds or its attempt budget is spent
    ///
    /// Retry waits happen on this thread only. Once the pool has stopped,
    /// remaining attempts still run but receive an already-cancelled context.
    fn execute_with_retry(id: usize, queued: QueuedJob, monitor: &Monitor, stats: &WorkerStats) {
        let job_ref = JobRef {
            id: queued.id(),
            name: queued.job().name().to_string(),
            priority: queued.priority(),
            submitted_at: queued.submitted_at(),
        };
        let mut job = queued.into_job();

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job = job.name(), job_id = %job.id());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        stats.record_job_taken();
        let max_attempts = job.max_attempts();
        let mut attempt = 1;

        loop {
            let (outcome, elapsed) = Self::run_attempt(&mut job, monitor);

            let error = match outcome {
                Ok(()) => {
                    stats.record_attempt(elapsed, false);
                    monitor.stats.record_success();

                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_attempt(elapsed, None);

                    monitor.notify(&PoolEvent::AttemptSucceeded {
                        worker_id: id,
                        job: job_ref,
                        attempt,
                        elapsed,
                    });
                    return;
                }
                Err(error) => error,
            };

            let kind = error.failure_kind();
            stats.record_attempt(elapsed, true);
            monitor.stats.record_failure(kind);

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_attempt(elapsed, Some(kind));

            let retry_in = job
                .retry_policy()
                .should_retry(attempt)
                .then(|| job.retry_policy().delay_after(attempt));

            monitor.notify(&PoolEvent::AttemptFailed {
                worker_id: id,
                job: job_ref.clone(),
                attempt,
                max_attempts,
                kind,
                error: error.to_string(),
                will_retry: retry_in.is_some(),
                retry_in,
            });

            match retry_in {
                Some(delay) => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    monitor.stats.record_retry();
                    attempt += 1;
                }
                None => {
                    monitor.stats.record_permanent_failure();
                    monitor.notify(&PoolEvent::PermanentFailure {
                        worker_id: id,
                        job: job_ref,
                        attempts: attempt,
                        error: error.to_string(),
                    });
                    return;
                }
            }
        }
    }

    /// Execute one attempt under a fresh child context with panic protection
    fn run_attempt(job: &mut Job, monitor: &Monitor) -> (Result<()>, std::time::Duration) {
        let ctx = match job.timeout() {
            Some(timeout) => monitor.lifetime.child_with_timeout(timeout),
            None => monitor.lifetime.child(),
        };

        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| job.run_attempt(&ctx)));
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => {
                // A task that gave up because its deadline passed reports
                // whatever error it chose; the attempt still counts as timed out.
                if ctx.deadline_exceeded() {
                    let timeout_ms = job.timeout().unwrap_or_default().as_millis() as u64;
                    Err(PoolError::deadline_exceeded(timeout_ms))
                } else {
                    Err(error)
                }
            }
            Err(payload) => Err(PoolError::panicked(panic_message(payload.as_ref()))),
        };

        (outcome, elapsed)
    }
}

/// Render a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
