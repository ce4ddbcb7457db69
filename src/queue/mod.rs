//! Ready queue: the ordered collection of jobs awaiting dispatch.
//!
//! Every implementation hands out jobs in the same total order:
//! priority descending, then submission time ascending. A job leaves the
//! queue exactly once, when a worker takes it; it is never put back.
//!
//! # Built-in Implementations
//!
//! - [`HeapQueue`]: binary heap, `O(log n)` push and pop (default)
//! - [`SortedQueue`]: vector re-sorted on every pop, `O(n log n)` per pop
//!
//! The queue itself is not synchronized. The pool keeps it behind the same
//! lock as its lifecycle state.

mod heap;
mod sorted;

pub use heap::HeapQueue;
pub use sorted::SortedQueue;

use crate::core::{Job, JobId, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

/// A job accepted by the pool, stamped with its submission time
///
/// The timestamp is assigned once, when the wrapper is created during
/// submission, and never changes. `sequence` comes from the same critical
/// section and only separates jobs whose `Instant`s compare equal.
pub struct QueuedJob {
    job: Job,
    created_at: Instant,
    submitted_at: DateTime<Utc>,
    sequence: u64,
}

impl QueuedJob {
    /// Stamp `job` with the current time
    pub fn new(job: Job, sequence: u64) -> Self {
        Self {
            job,
            created_at: Instant::now(),
            submitted_at: Utc::now(),
            sequence,
        }
    }

    /// Scheduling priority of the wrapped job
    pub fn priority(&self) -> Priority {
        self.job.priority()
    }

    /// Identifier of the wrapped job
    pub fn id(&self) -> JobId {
        self.job.id()
    }

    /// Monotonic submission time, the tie-break key within a priority
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Wall-clock submission time, for reporting
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Submission sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The wrapped job
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Unwrap into the job
    pub fn into_job(self) -> Job {
        self.job
    }
}

impl fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("job", &self.job)
            .field("submitted_at", &self.submitted_at)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Dispatch order: a greater job is dispatched first
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            // Earlier submission wins, so the comparison is reversed
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedJob {}

/// Storage and selection policy for pending jobs
pub trait ReadyQueue: Send {
    /// Add a job; never rejects
    fn push(&mut self, job: QueuedJob);

    /// Remove and return the job that should run next
    fn pop(&mut self) -> Option<QueuedJob>;

    /// Number of pending jobs
    fn len(&self) -> usize;

    /// Whether no job is pending
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every pending job, in dispatch order
    fn drain(&mut self) -> Vec<QueuedJob>;

    /// Which implementation this is
    fn kind(&self) -> QueueKind;
}

/// Selects the ready queue implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// [`HeapQueue`]
    #[default]
    Heap,
    /// [`SortedQueue`]
    Sorted,
}

impl QueueKind {
    /// Create an empty queue of this kind
    pub fn build(&self) -> Box<dyn ReadyQueue> {
        match self {
            QueueKind::Heap => Box::new(HeapQueue::new()),
            QueueKind::Sorted => Box::new(SortedQueue::new()),
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Heap => write!(f, "heap"),
            QueueKind::Sorted => write!(f, "sorted"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::queued;
    use super::*;

    #[test]
    fn test_higher_priority_orders_first() {
        let low = queued(Priority::Low, 0);
        let high = queued(Priority::High, 1);
        assert!(high > low);
    }

    #[test]
    fn test_earlier_submission_orders_first_within_priority() {
        let first = queued(Priority::Normal, 0);
        let second = queued(Priority::Normal, 1);
        assert!(first > second);
    }

    #[test]
    fn test_queue_kind_build() {
        for kind in [QueueKind::Heap, QueueKind::Sorted] {
            let queue = kind.build();
            assert_eq!(queue.kind(), kind);
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_both_kinds_agree_on_dispatch_order() {
        let priorities = [
            Priority::Low,
            Priority::High,
            Priority::Normal,
            Priority::High,
            Priority::Low,
            Priority::Normal,
        ];

        let mut orders = Vec::new();
        for kind in [QueueKind::Heap, QueueKind::Sorted] {
            let mut queue = kind.build();
            for (seq, priority) in priorities.iter().enumerate() {
                queue.push(queued(*priority, seq as u64));
            }
            let order: Vec<u64> = std::iter::from_fn(|| queue.pop())
                .map(|job| job.sequence())
                .collect();
            orders.push(order);
        }

        assert_eq!(orders[0], vec![1, 3, 2, 5, 0, 4]);
        assert_eq!(orders[0], orders[1]);
    }
}
