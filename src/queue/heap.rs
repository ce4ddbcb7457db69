//! Binary-heap ready queue.

use super::{QueueKind, QueuedJob, ReadyQueue};
use std::collections::BinaryHeap;

/// Ready queue backed by a max-heap of [`QueuedJob`]
///
/// `O(log n)` push and pop. This is the default.
#[derive(Debug, Default)]
pub struct HeapQueue {
    heap: BinaryHeap<QueuedJob>,
}

impl HeapQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Create a new queue with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }
}

impl ReadyQueue for HeapQueue {
    fn push(&mut self, job: QueuedJob) {
        self.heap.push(job);
    }

    fn pop(&mut self) -> Option<QueuedJob> {
        self.heap.pop()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn drain(&mut self) -> Vec<QueuedJob> {
        let mut jobs = std::mem::take(&mut self.heap).into_sorted_vec();
        jobs.reverse();
        jobs
    }

    fn kind(&self) -> QueueKind {
        QueueKind::Heap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Priority;
    use crate::queue::test_support::queued;

    #[test]
    fn test_priority_queue_ordering() {
        let mut queue = HeapQueue::new();

        queue.push(queued(Priority::Low, 0));
        queue.push(queued(Priority::High, 1));
        queue.push(queued(Priority::Normal, 2));

        assert_eq!(queue.pop().unwrap().priority(), Priority::High);
        assert_eq!(queue.pop().unwrap().priority(), Priority::Normal);
        assert_eq!(queue.pop().unwrap().priority(), Priority::Low);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut queue = HeapQueue::with_capacity(3);

        for seq in 1..=3 {
            queue.push(queued(Priority::Normal, seq));
        }

        assert_eq!(queue.pop().unwrap().sequence(), 1);
        assert_eq!(queue.pop().unwrap().sequence(), 2);
        assert_eq!(queue.pop().unwrap().sequence(), 3);
    }

    #[test]
    fn test_drain_returns_dispatch_order() {
        let mut queue = HeapQueue::new();
        queue.push(queued(Priority::Low, 0));
        queue.push(queued(Priority::High, 1));
        queue.push(queued(Priority::High, 2));

        let drained: Vec<u64> = queue.drain().iter().map(QueuedJob::sequence).collect();
        assert_eq!(drained, vec![1, 2, 0]);
        assert!(queue.is_empty());
    }
}
