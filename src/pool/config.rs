//! Worker pool configuration

use crate::core::{PoolError, Result};
use crate::queue::QueueKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How `submit` behaves when a bounded ready queue is full
///
/// Only consulted when `max_queue_size > 0`; an unbounded queue never
/// pushes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureStrategy {
    /// Block until space is available (default behavior).
    #[default]
    Block,

    /// Block with timeout, return error if exceeded.
    BlockWithTimeout(Duration),

    /// Return error immediately if queue is full.
    RejectImmediately,
}

/// What `stop()` does with jobs that are still queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Queued jobs are never started. They are dropped and counted as
    /// discarded; only jobs already taken by a worker finish.
    #[default]
    Discard,
    /// Workers keep taking jobs until the queue is empty, then exit.
    /// The lifetime context is cancelled once every worker has exited.
    Drain,
}

/// What `scale_to` does when the new target is below the live worker count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDownPolicy {
    /// Excess workers exit the next time they look for work, after
    /// finishing the job they hold.
    #[default]
    Retire,
    /// Only the target is lowered. Every spawned worker keeps running until
    /// `stop()`, and a later scale-up spawns `new - old_target` workers
    /// regardless of how many are alive.
    Lazy,
}

/// Configuration for a worker pool
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::{QueueKind, ShutdownMode, WorkerPoolConfig};
///
/// let config = WorkerPoolConfig::new(4)
///     .with_thread_name_prefix("mailer")
///     .with_queue_kind(QueueKind::Sorted)
///     .with_shutdown_mode(ShutdownMode::Drain);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of workers spawned at construction (0 = number of CPUs)
    pub num_workers: usize,
    /// Thread name prefix; workers are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// Ready queue implementation
    pub queue_kind: QueueKind,
    /// Maximum queue size (0 = unbounded)
    pub max_queue_size: usize,
    /// Backpressure strategy for bounded queues
    pub backpressure: BackpressureStrategy,
    /// Fate of queued jobs at stop
    pub shutdown_mode: ShutdownMode,
    /// Behavior of `scale_to` below the live worker count
    pub scale_down: ScaleDownPolicy,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            thread_name_prefix: "pool-worker".to_string(),
            queue_kind: QueueKind::default(),
            max_queue_size: 0,
            backpressure: BackpressureStrategy::default(),
            shutdown_mode: ShutdownMode::default(),
            scale_down: ScaleDownPolicy::default(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: if num_workers == 0 {
                num_cpus::get()
            } else {
                num_workers
            },
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Select the ready queue implementation
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_kind(mut self, kind: QueueKind) -> Self {
        self.queue_kind = kind;
        self
    }

    /// Set maximum queue size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Set the backpressure strategy for bounded queues.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backpressure(mut self, strategy: BackpressureStrategy) -> Self {
        self.backpressure = strategy;
        self
    }

    /// Reject submissions immediately when the queue is full.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn reject_when_full(self) -> Self {
        self.with_backpressure(BackpressureStrategy::RejectImmediately)
    }

    /// Block submissions for at most `timeout` when the queue is full.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn block_with_timeout(self, timeout: Duration) -> Self {
        self.with_backpressure(BackpressureStrategy::BlockWithTimeout(timeout))
    }

    /// Set what happens to queued jobs at stop
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_shutdown_mode(mut self, mode: ShutdownMode) -> Self {
        self.shutdown_mode = mode;
        self
    }

    /// Set the scale-down policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_scale_down(mut self, policy: ScaleDownPolicy) -> Self {
        self.scale_down = policy;
        self
    }

    /// Whether the ready queue has a capacity limit
    pub fn is_bounded(&self) -> bool {
        self.max_queue_size > 0
    }

    /// Workers to spawn at construction, resolving 0 to the CPU count
    pub(crate) fn initial_workers(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.trim().is_empty() {
            return Err(PoolError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        if let BackpressureStrategy::BlockWithTimeout(timeout) = self.backpressure {
            if timeout.is_zero() {
                return Err(PoolError::invalid_config(
                    "backpressure",
                    "Submission timeout must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}
