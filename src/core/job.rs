//! Job descriptor and the task trait

use crate::core::cancellation::CancellationToken;
use crate::core::error::Result;
use crate::core::priority::Priority;
use crate::core::retry::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// The body of a job
///
/// A task may run several times (once per attempt), but never concurrently
/// with itself: the worker executing the job holds it exclusively.
/// Closures of the form `FnMut(&CancellationToken) -> Result<()>` implement
/// this trait automatically.
pub trait Task: Send {
    /// Run one attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt failed; the pool may retry it
    fn run(&mut self, ctx: &CancellationToken) -> Result<()>;
}

impl<F> Task for F
where
    F: FnMut(&CancellationToken) -> Result<()> + Send,
{
    fn run(&mut self, ctx: &CancellationToken) -> Result<()> {
        self(ctx)
    }
}

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work submitted to the pool
///
/// Built with chained setters; the submission timestamp is not part of the
/// builder because the pool stamps it when the job is accepted.
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::{Job, Priority};
/// use std::time::Duration;
///
/// let job = Job::new(|ctx| {
///     ctx.check()?;
///     Ok(())
/// })
/// .with_name("send-welcome-mail")
/// .with_priority(Priority::High)
/// .with_retry(2)
/// .with_retry_delay(Duration::from_millis(500))
/// .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(job.max_attempts(), 3);
/// ```
pub struct Job {
    id: JobId,
    name: String,
    task: Box<dyn Task>,
    priority: Priority,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl Job {
    /// Create a job from a closure with normal priority, no retries and no
    /// per-attempt timeout
    pub fn new<F>(task: F) -> Self
    where
        F: FnMut(&CancellationToken) -> Result<()> + Send + 'static,
    {
        Self::from_task(task)
    }

    /// Create a job from any [`Task`] implementation
    pub fn from_task<T: Task + 'static>(task: T) -> Self {
        Self {
            id: JobId::new(),
            name: "job".to_string(),
            task: Box::new(task),
            priority: Priority::default(),
            retry: RetryPolicy::none(),
            timeout: None,
        }
    }

    /// Set a name used in log lines
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Set the scheduling priority
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the number of retries after the first attempt
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    /// Set the fixed wait between attempts
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = delay;
        self
    }

    /// Set the backoff applied to the retry delay
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.retry.backoff = backoff;
        self
    }

    /// Replace the whole retry policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the per-attempt timeout
    ///
    /// Each attempt gets a fresh deadline derived from the pool's lifetime
    /// context. The task only stops early if it observes its context.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Job identifier
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Job name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheduling priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Total attempts allowed: retries + 1
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts()
    }

    /// Run one attempt of the task
    pub(crate) fn run_attempt(&mut self, ctx: &CancellationToken) -> Result<()> {
        self.task.run(ctx)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PoolError;

    struct CountingTask {
        runs: usize,
    }

    impl Task for CountingTask {
        fn run(&mut self, _ctx: &CancellationToken) -> Result<()> {
            self.runs += 1;
            if self.runs < 2 {
                Err(PoolError::task("not yet"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_job_defaults() {
        let job = Job::new(|_| Ok(()));
        assert_eq!(job.name(), "job");
        assert_eq!(job.priority(), Priority::Normal);
        assert_eq!(job.max_attempts(), 1);
        assert!(job.timeout().is_none());
    }

    #[test]
    fn test_job_builder() {
        let job = Job::new(|_| Ok(()))
            .with_name("resize-avatar")
            .with_priority(Priority::Low)
            .with_retry(4)
            .with_retry_delay(Duration::from_millis(20))
            .with_timeout(Duration::from_secs(1));

        assert_eq!(job.name(), "resize-avatar");
        assert_eq!(job.priority(), Priority::Low);
        assert_eq!(job.max_attempts(), 5);
        assert_eq!(job.retry_policy().delay, Duration::from_millis(20));
        assert_eq!(job.timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = Job::new(|_| Ok(()));
        let b = Job::new(|_| Ok(()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_struct_task_keeps_state_between_attempts() {
        let mut job = Job::from_task(CountingTask { runs: 0 });
        let ctx = CancellationToken::new();

        assert!(job.run_attempt(&ctx).is_err());
        assert!(job.run_attempt(&ctx).is_ok());
    }

    #[test]
    fn test_closure_task_receives_context() {
        let mut job = Job::new(|ctx| ctx.check());
        let ctx = CancellationToken::new();
        assert!(job.run_attempt(&ctx).is_ok());

        ctx.cancel();
        assert!(job.run_attempt(&ctx).is_err());
    }
}
