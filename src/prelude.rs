//! Convenient re-exports for common types and traits

pub use crate::core::{
    Backoff, CancellationReason, CancellationToken, Job, JobId, PoolError, PoolState, Priority,
    Result, RetryPolicy, Task,
};
pub use crate::observer::{LogObserver, PoolEvent, PoolObserver};
pub use crate::pool::{ScaleDownPolicy, ShutdownMode, WorkerPool, WorkerPoolConfig};
