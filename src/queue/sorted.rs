//! Re-sort-on-pop ready queue.

use super::{QueueKind, QueuedJob, ReadyQueue};

/// Ready queue that appends on push and fully re-sorts on every pop
///
/// `O(1)` push, `O(n log n)` pop. Fine for short queues; prefer
/// [`HeapQueue`](super::HeapQueue) when many jobs pile up.
#[derive(Debug, Default)]
pub struct SortedQueue {
    jobs: Vec<QueuedJob>,
}

impl SortedQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }
}

impl ReadyQueue for SortedQueue {
    fn push(&mut self, job: QueuedJob) {
        self.jobs.push(job);
    }

    fn pop(&mut self) -> Option<QueuedJob> {
        // Ascending dispatch order puts the next job last
        self.jobs.sort();
        self.jobs.pop()
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }

    fn drain(&mut self) -> Vec<QueuedJob> {
        let mut jobs = std::mem::take(&mut self.jobs);
        jobs.sort_by(|a, b| b.cmp(a));
        jobs
    }

    fn kind(&self) -> QueueKind {
        QueueKind::Sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Priority;
    use crate::queue::test_support::queued;

    #[test]
    fn test_pop_selects_highest_then_oldest() {
        let mut queue = SortedQueue::new();
        queue.push(queued(Priority::Normal, 0));
        queue.push(queued(Priority::Low, 1));
        queue.push(queued(Priority::Normal, 2));
        queue.push(queued(Priority::High, 3));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop())
            .map(|job| job.sequence())
            .collect();
        assert_eq!(order, vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_push_after_pop_keeps_order() {
        let mut queue = SortedQueue::new();
        queue.push(queued(Priority::Low, 0));
        queue.push(queued(Priority::Low, 1));
        assert_eq!(queue.pop().unwrap().sequence(), 0);

        queue.push(queued(Priority::High, 2));
        assert_eq!(queue.pop().unwrap().sequence(), 2);
        assert_eq!(queue.pop().unwrap().sequence(), 1);
        assert_eq!(queue.len(), 0);
    }
}
