//! Worker pool controller, workers and their shared state

pub mod config;
mod monitor;
pub mod stats;
mod worker;
pub mod worker_pool;

pub use crate::core::PoolState;
pub use config::{BackpressureStrategy, ScaleDownPolicy, ShutdownMode, WorkerPoolConfig};
pub use monitor::WorkerExit;
pub use stats::{PoolStats, PoolStatsSnapshot, WorkerStats, WorkerStatsSnapshot};
pub use worker_pool::WorkerPool;
