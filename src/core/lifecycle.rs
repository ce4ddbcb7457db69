//! Pool lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a worker pool. Transitions only move forward:
/// `Running → Stopping → Stopped`. There is no restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Accepting submissions and dispatching jobs
    Running,
    /// `stop()` has begun; submissions fail, workers are winding down
    Stopping,
    /// Every worker has exited
    Stopped,
}

impl PoolState {
    /// Whether submissions are accepted in this state
    pub fn accepts_work(&self) -> bool {
        matches!(self, PoolState::Running)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Running => write!(f, "running"),
            PoolState::Stopping => write!(f, "stopping"),
            PoolState::Stopped => write!(f, "stopped"),
        }
    }
}
