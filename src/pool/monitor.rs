//! Shared state guarded by the pool monitor
//!
//! One lock covers the ready queue, the lifecycle state and the worker
//! counters. `work_available` wakes idle workers (signalled by submit, stop
//! and scale-down); `space_available` wakes submitters blocked on a full
//! bounded queue (signalled by dequeue and stop).

use crate::core::{CancellationToken, Job, JobId, PoolError, PoolState, Result};
use crate::observer::{PoolEvent, PoolObserver};
use crate::pool::config::{BackpressureStrategy, ScaleDownPolicy, ShutdownMode, WorkerPoolConfig};
use crate::pool::stats::PoolStats;
use crate::pool::worker::panic_message;
use crate::queue::{QueuedJob, ReadyQueue};
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Why a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerExit {
    /// The pool stopped and queued work is being discarded
    Shutdown,
    /// The pool stopped and the queue has been emptied
    Drained,
    /// The pool was scaled below the live worker count
    Retired,
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Shutdown => write!(f, "shutdown"),
            WorkerExit::Drained => write!(f, "drained"),
            WorkerExit::Retired => write!(f, "retired"),
        }
    }
}

/// Result of a worker asking for its next job
pub(crate) enum Dispatch {
    Run(QueuedJob),
    Exit(WorkerExit),
}

pub(crate) struct MonitorState {
    pub(crate) queue: Box<dyn ReadyQueue>,
    pub(crate) lifecycle: PoolState,
    /// Intended worker count, as last set by construction or `scale_to`
    pub(crate) target_workers: usize,
    /// Workers spawned and not yet exited
    pub(crate) live_workers: usize,
    next_sequence: u64,
}

pub(crate) struct Monitor {
    state: Mutex<MonitorState>,
    work_available: Condvar,
    space_available: Condvar,
    pub(crate) config: WorkerPoolConfig,
    pub(crate) stats: PoolStats,
    observer: Arc<dyn PoolObserver>,
    /// Parent of every attempt context; cancelled at stop
    pub(crate) lifetime: CancellationToken,
}

impl Monitor {
    pub(crate) fn new(config: WorkerPoolConfig, observer: Arc<dyn PoolObserver>) -> Self {
        let state = MonitorState {
            queue: config.queue_kind.build(),
            lifecycle: PoolState::Running,
            target_workers: 0,
            live_workers: 0,
            next_sequence: 0,
        };

        Self {
            state: Mutex::new(state),
            work_available: Condvar::new(),
            space_available: Condvar::new(),
            config,
            stats: PoolStats::new(),
            observer,
            lifetime: CancellationToken::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock()
    }

    /// Hand `event` to the observer
    ///
    /// A panicking observer loses the event but never takes the calling
    /// worker or controller down with it.
    pub(crate) fn notify(&self, event: &PoolEvent) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.observer.on_event(event))) {
            log::error!(
                "pool observer panicked on {:?}: {}",
                event,
                panic_message(payload.as_ref())
            );
        }
    }

    /// Wake every idle worker and every blocked submitter
    pub(crate) fn wake_all(&self) {
        self.work_available.notify_all();
        self.space_available.notify_all();
    }

    /// Wake idle workers so excess ones can retire
    pub(crate) fn wake_workers(&self) {
        self.work_available.notify_all();
    }

    /// Stamp `job` and add it to the ready queue
    ///
    /// The timestamp and sequence number are taken inside the critical
    /// section, so queue order agrees with the order submissions won the lock.
    pub(crate) fn enqueue(&self, job: Job) -> Result<JobId> {
        let mut state = self.state.lock();
        Self::ensure_running(&state)?;

        if self.config.is_bounded() {
            self.wait_for_space(&mut state)?;
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let queued = QueuedJob::new(job, sequence);
        let id = queued.id();
        state.queue.push(queued);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(state.queue.len());

        drop(state);
        self.work_available.notify_one();
        self.stats.record_submitted();
        Ok(id)
    }

    fn ensure_running(state: &MonitorState) -> Result<()> {
        if state.lifecycle.accepts_work() {
            Ok(())
        } else {
            Err(PoolError::rejected(state.lifecycle))
        }
    }

    fn wait_for_space(&self, state: &mut MutexGuard<'_, MonitorState>) -> Result<()> {
        let max = self.config.max_queue_size;

        match self.config.backpressure {
            BackpressureStrategy::Block => {
                while state.queue.len() >= max {
                    self.space_available.wait(state);
                    Self::ensure_running(state)?;
                }
            }
            BackpressureStrategy::BlockWithTimeout(timeout) => {
                let deadline = Instant::now().checked_add(timeout);
                while state.queue.len() >= max {
                    let timed_out = match deadline {
                        Some(deadline) => self.space_available.wait_until(state, deadline).timed_out(),
                        None => {
                            self.space_available.wait(state);
                            false
                        }
                    };
                    Self::ensure_running(state)?;
                    if timed_out && state.queue.len() >= max {
                        return Err(PoolError::submission_timeout(timeout.as_millis() as u64));
                    }
                }
            }
            BackpressureStrategy::RejectImmediately => {
                let current = state.queue.len();
                if current >= max {
                    return Err(PoolError::queue_full(current, max));
                }
            }
        }
        Ok(())
    }

    /// Block until there is a job for the calling worker or a reason to exit
    pub(crate) fn next_job(&self) -> Dispatch {
        let mut state = self.state.lock();

        loop {
            if state.lifecycle != PoolState::Running {
                match self.config.shutdown_mode {
                    ShutdownMode::Discard => return Self::exit(&mut state, WorkerExit::Shutdown),
                    ShutdownMode::Drain if state.queue.is_empty() => {
                        return Self::exit(&mut state, WorkerExit::Drained)
                    }
                    ShutdownMode::Drain => {}
                }
            }

            if self.config.scale_down == ScaleDownPolicy::Retire
                && state.live_workers > state.target_workers
            {
                return Self::exit(&mut state, WorkerExit::Retired);
            }

            if let Some(job) = state.queue.pop() {
                if self.config.is_bounded() {
                    self.space_available.notify_one();
                }
                return Dispatch::Run(job);
            }

            self.work_available.wait(&mut state);
        }
    }

    fn exit(state: &mut MonitorState, reason: WorkerExit) -> Dispatch {
        state.live_workers = state.live_workers.saturating_sub(1);
        Dispatch::Exit(reason)
    }
}
