//! Job priority levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job priority levels (higher number = higher priority)
///
/// Priorities compare ordinally, so `High > Normal > Low` and the ready
/// queue can order jobs with the derived `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background work
    Low = 0,
    /// Default for most jobs
    #[default]
    Normal = 1,
    /// Dispatched ahead of everything else
    High = 2,
}

impl Priority {
    /// Get the numeric value of the priority
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// All priorities from highest to lowest
    pub fn descending() -> [Priority; 3] {
        [Priority::High, Priority::Normal, Priority::Low]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}
