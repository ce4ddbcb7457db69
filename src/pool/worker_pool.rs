//! Worker pool controller

use crate::core::{
    CancellationReason, CancellationToken, Job, JobId, PoolError, PoolState, Priority, Result,
};
use crate::observer::{LogObserver, PoolEvent, PoolObserver};
use crate::pool::config::{ScaleDownPolicy, ShutdownMode, WorkerPoolConfig};
use crate::pool::monitor::Monitor;
use crate::pool::stats::PoolStats;
use crate::pool::worker::Worker;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

/// In-process executor with priority scheduling, retries, per-attempt
/// deadlines, panic containment, resizing and graceful shutdown
///
/// Workers start at construction; there is no separate start step. The pool
/// is fire-and-forget: `submit` hands back only a [`JobId`], and outcomes
/// surface through the [`PoolObserver`] and [`PoolStats`].
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::{Job, Priority, WorkerPool};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> rust_worker_pool::Result<()> {
/// let pool = WorkerPool::new(2)?;
/// let sent = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&sent);
/// pool.submit(
///     Job::new(move |_ctx| {
///         counter.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     })
///     .with_priority(Priority::High)
///     .with_retry(3),
/// )?;
///
/// pool.stop()?;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    monitor: Arc<Monitor>,
    /// Handles of every worker not yet joined. Taken before the monitor lock.
    workers: Mutex<Vec<Worker>>,
    next_worker_id: Mutex<usize>,
    exit_tx: Sender<usize>,
    exit_rx: Receiver<usize>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.monitor.lock();
        f.debug_struct("WorkerPool")
            .field("config", &self.monitor.config)
            .field("state", &state.lifecycle)
            .field("target_workers", &state.target_workers)
            .field("live_workers", &state.live_workers)
            .field("queue_kind", &state.queue.kind())
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with `num_workers` workers (0 = number of CPUs)
    pub fn new(num_workers: usize) -> Result<Self> {
        Self::with_config(WorkerPoolConfig::new(num_workers))
    }

    /// Create a pool with custom configuration, logging through [`LogObserver`]
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(LogObserver))
    }

    /// Create a pool that reports events to `observer`
    pub fn with_observer(config: WorkerPoolConfig, observer: Arc<dyn PoolObserver>) -> Result<Self> {
        config.validate()?;

        let initial = config.initial_workers();
        let (exit_tx, exit_rx) = crossbeam_channel::unbounded();
        let pool = Self {
            monitor: Arc::new(Monitor::new(config, observer)),
            workers: Mutex::new(Vec::with_capacity(initial)),
            next_worker_id: Mutex::new(0),
            exit_tx,
            exit_rx,
        };

        {
            let mut workers = pool.workers.lock();
            pool.monitor.lock().target_workers = initial;
            // On failure the partially built pool is dropped, which stops it
            pool.spawn_workers(&mut workers, initial)?;
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(
            initial,
            &pool.monitor.lock().queue.kind().to_string(),
        );

        Ok(pool)
    }

    /// Submit a job
    ///
    /// Fails with [`PoolError::SubmissionRejected`](crate::PoolError::SubmissionRejected)
    /// once `stop()` has begun. With a bounded queue the configured
    /// [`BackpressureStrategy`](crate::BackpressureStrategy) decides whether a
    /// full queue blocks, times out or rejects.
    pub fn submit(&self, job: Job) -> Result<JobId> {
        self.monitor.enqueue(job)
    }

    /// Submit a closure with normal priority and no retries
    pub fn execute<F>(&self, f: F) -> Result<JobId>
    where
        F: FnMut(&CancellationToken) -> Result<()> + Send + 'static,
    {
        self.submit(Job::new(f))
    }

    /// Submit a closure with the given priority and no retries
    pub fn execute_with_priority<F>(&self, priority: Priority, f: F) -> Result<JobId>
    where
        F: FnMut(&CancellationToken) -> Result<()> + Send + 'static,
    {
        self.submit(Job::new(f).with_priority(priority))
    }

    /// Change the intended number of workers
    ///
    /// Growing spawns the missing workers right away. Shrinking depends on
    /// [`ScaleDownPolicy`]: `Retire` lets excess workers exit after their
    /// current job, `Lazy` only lowers the target. Fails once `stop()` has
    /// begun, or if a worker thread cannot be spawned.
    pub fn scale_to(&self, num_workers: usize) -> Result<()> {
        let mut workers = self.workers.lock();
        self.reap_exited(&mut workers)?;

        let (from, to_spawn) = {
            let mut state = self.monitor.lock();
            if !state.lifecycle.accepts_work() {
                return Err(PoolError::rejected(state.lifecycle));
            }
            let from = state.target_workers;
            state.target_workers = num_workers;
            let to_spawn = match self.monitor.config.scale_down {
                ScaleDownPolicy::Retire => num_workers.saturating_sub(state.live_workers),
                ScaleDownPolicy::Lazy => num_workers.saturating_sub(from),
            };
            (from, to_spawn)
        };

        if num_workers < from {
            self.monitor.wake_workers();
        }
        self.spawn_workers(&mut workers, to_spawn)?;

        self.monitor.notify(&PoolEvent::Scaled {
            from,
            to: num_workers,
        });
        Ok(())
    }

    /// Stop the pool and wait for every worker to exit
    ///
    /// Submissions fail from the moment this is called. What happens to
    /// queued jobs depends on [`ShutdownMode`]; a job already taken by a
    /// worker always finishes its attempt loop before `stop` returns.
    /// Calling `stop` again is a no-op.
    pub fn stop(&self) -> Result<()> {
        let mut workers = self.workers.lock();

        {
            let mut state = self.monitor.lock();
            if state.lifecycle != PoolState::Running {
                return Ok(());
            }
            state.lifecycle = PoolState::Stopping;
        }

        let mode = self.monitor.config.shutdown_mode;
        if mode == ShutdownMode::Discard {
            self.monitor
                .lifetime
                .cancel_with_reason(CancellationReason::Shutdown);
        }
        self.monitor.wake_all();

        let mut first_error = None;
        for worker in workers.drain(..) {
            if let Err(e) = worker.join() {
                first_error.get_or_insert(e);
            }
        }
        self.exit_rx.try_iter().for_each(drop);

        if mode == ShutdownMode::Drain {
            self.monitor
                .lifetime
                .cancel_with_reason(CancellationReason::Shutdown);
        }

        let discarded = {
            let mut state = self.monitor.lock();
            state.lifecycle = PoolState::Stopped;
            state.queue.drain()
        };
        let count = discarded.len();
        drop(discarded);

        if count > 0 {
            self.monitor.stats.record_discarded(count);
            self.monitor.notify(&PoolEvent::JobsDiscarded { count });
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            self.monitor.stats.succeeded(),
            self.monitor.stats.permanent_failures(),
            self.monitor.stats.discarded(),
        );

        self.monitor.notify(&PoolEvent::PoolStopped);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.monitor.lock().lifecycle
    }

    /// Whether the pool accepts submissions
    pub fn is_running(&self) -> bool {
        self.state().accepts_work()
    }

    /// Intended number of workers
    pub fn worker_count(&self) -> usize {
        self.monitor.lock().target_workers
    }

    /// Workers spawned and not yet exited
    pub fn live_workers(&self) -> usize {
        self.monitor.lock().live_workers
    }

    /// Jobs waiting in the ready queue
    pub fn queue_len(&self) -> usize {
        self.monitor.lock().queue.len()
    }

    /// Pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.monitor.stats
    }

    /// Pool configuration
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.monitor.config
    }

    fn spawn_workers(&self, workers: &mut Vec<Worker>, count: usize) -> Result<()> {
        for _ in 0..count {
            let id = {
                let mut next = self.next_worker_id.lock();
                let id = *next;
                *next += 1;
                id
            };

            // Counted before the thread exists so it cannot retire early
            self.monitor.lock().live_workers += 1;
            match Worker::spawn(id, Arc::clone(&self.monitor), self.exit_tx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    let mut state = self.monitor.lock();
                    state.live_workers = state.live_workers.saturating_sub(1);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Join workers that have already left their loop
    fn reap_exited(&self, workers: &mut Vec<Worker>) -> Result<()> {
        for id in self.exit_rx.try_iter() {
            if let Some(pos) = workers.iter().position(|w| w.id() == id) {
                workers.swap_remove(pos).join()?;
            }
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                log::error!(
                    "Failed to stop worker pool '{}' during drop: {}",
                    self.monitor.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}
