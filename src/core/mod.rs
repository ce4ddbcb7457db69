//! Core types shared by the pool, its workers and job authors

pub mod cancellation;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod priority;
pub mod retry;

pub use cancellation::{CancellationReason, CancellationToken};
pub use error::{FailureKind, PoolError, Result};
pub use job::{Job, JobId, Task};
pub use lifecycle::PoolState;
pub use priority::Priority;
pub use retry::{Backoff, RetryPolicy};
