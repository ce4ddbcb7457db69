//! Error types for the worker pool

use crate::core::lifecycle::PoolState;

/// Result type for worker pool operations and task bodies
pub type Result<T> = std::result::Result<T, PoolError>;

/// How a failed attempt is classified in logs and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The task returned an error
    Error,
    /// The task panicked and the panic was caught
    Panic,
    /// The attempt context ran past its deadline
    DeadlineExceeded,
}

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool is not accepting work
    #[error("Worker pool is {state}; job submission rejected")]
    SubmissionRejected {
        /// Lifecycle state observed at submission time
        state: PoolState,
    },

    /// Queue is full with capacity details
    #[error("Ready queue is full: {current}/{max} jobs queued")]
    QueueFull {
        /// Current queue size
        current: usize,
        /// Maximum queue size
        max: usize,
    },

    /// Job submission timed out waiting for queue space
    #[error("Job submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// The task returned a failure
    #[error("Task failed: {message}")]
    TaskFailed {
        /// Error message
        message: String,
    },

    /// The task panicked
    #[error("Task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text
        message: String,
    },

    /// The attempt context expired before the task returned
    #[error("Attempt deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded {
        /// Per-attempt timeout in milliseconds
        timeout_ms: u64,
    },

    /// The attempt context was cancelled for a reason other than its deadline
    #[error("Cancelled: {reason}")]
    Cancelled {
        /// Reason for cancellation
        reason: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create a submission rejected error
    pub fn rejected(state: PoolState) -> Self {
        PoolError::SubmissionRejected { state }
    }

    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        PoolError::QueueFull { current, max }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(timeout_ms: u64) -> Self {
        PoolError::SubmissionTimeout { timeout_ms }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a task failure, the usual way for a task body to report an error
    pub fn task(message: impl Into<String>) -> Self {
        PoolError::TaskFailed {
            message: message.into(),
        }
    }

    /// Create a panic error
    pub fn panicked(message: impl Into<String>) -> Self {
        PoolError::Panicked {
            message: message.into(),
        }
    }

    /// Create a deadline exceeded error
    pub fn deadline_exceeded(timeout_ms: u64) -> Self {
        PoolError::DeadlineExceeded { timeout_ms }
    }

    /// Create a cancelled error
    pub fn cancelled(reason: impl Into<String>) -> Self {
        PoolError::Cancelled {
            reason: reason.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }

    /// Whether this error means the pool refused a submission
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PoolError::SubmissionRejected { .. }
                | PoolError::QueueFull { .. }
                | PoolError::SubmissionTimeout { .. }
        )
    }

    /// Classify an attempt failure
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PoolError::Panicked { .. } => FailureKind::Panic,
            PoolError::DeadlineExceeded { .. } => FailureKind::DeadlineExceeded,
            _ => FailureKind::Error,
        }
    }
}
