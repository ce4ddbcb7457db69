//! # Rust Worker Pool
//!
//! An in-process worker pool for background jobs: priority scheduling,
//! bounded retry with backoff, per-attempt deadlines, panic containment,
//! dynamic resizing and graceful shutdown.
//!
//! ## Features
//!
//! - **Priority scheduling**: `High` before `Normal` before `Low`, oldest first within a level
//! - **Retries**: per-job attempt budget with fixed or exponential backoff and optional jitter
//! - **Deadlines**: each attempt runs under a fresh [`CancellationToken`] with the job's timeout
//! - **Panic containment**: a panicking task is retried like a failing one; workers survive
//! - **Scaling**: [`WorkerPool::scale_to`] grows immediately and shrinks per [`ScaleDownPolicy`]
//! - **Shutdown**: [`WorkerPool::stop`] waits for running jobs; queued ones follow [`ShutdownMode`]
//! - **Observability**: outcomes reach an injected [`PoolObserver`] and [`PoolStats`]
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(4)?;
//!
//! for i in 0..10 {
//!     pool.execute(move |_ctx| {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Retries and Deadlines
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::new(2)?;
//!
//! pool.submit(
//!     Job::new(|ctx| {
//!         // Cooperative: returns early once the attempt deadline passes
//!         ctx.sleep(Duration::from_millis(5))?;
//!         Ok(())
//!     })
//!     .with_name("refresh-cache")
//!     .with_priority(Priority::Low)
//!     .with_retry(2)
//!     .with_retry_delay(Duration::from_millis(10))
//!     .with_timeout(Duration::from_secs(1)),
//! )?;
//!
//! pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pool Configuration
//!
//! ```rust
//! use rust_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = WorkerPoolConfig::new(8)
//!     .with_thread_name_prefix("mailer")
//!     .with_max_queue_size(1000)
//!     .reject_when_full()
//!     .with_shutdown_mode(ShutdownMode::Drain);
//!
//! let pool = WorkerPool::with_config(config)?;
//! # pool.stop()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod observer;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{
    Backoff, CancellationReason, CancellationToken, FailureKind, Job, JobId, PoolError, PoolState,
    Priority, Result, RetryPolicy, Task,
};
pub use crate::observer::{JobRef, LogObserver, NoopObserver, PoolEvent, PoolObserver};
pub use crate::pool::{
    BackpressureStrategy, PoolStats, PoolStatsSnapshot, ScaleDownPolicy, ShutdownMode, WorkerExit,
    WorkerPool, WorkerPoolConfig, WorkerStats, WorkerStatsSnapshot,
};
pub use crate::queue::{HeapQueue, QueueKind, QueuedJob, ReadyQueue, SortedQueue};
