//! Cancellation contexts for task attempts
//!
//! Every attempt of a job receives a [`CancellationToken`] derived from the
//! pool's lifetime token. The attempt token is cancelled when the pool stops
//! or when the job's per-attempt timeout elapses, whichever comes first.
//! Cancellation is cooperative: a task observes it through
//! [`is_cancelled()`](CancellationToken::is_cancelled),
//! [`check()`](CancellationToken::check) or
//! [`sleep()`](CancellationToken::sleep).
//!
//! # Example
//!
//! ```rust
//! use rust_worker_pool::CancellationToken;
//! use std::time::Duration;
//!
//! let lifetime = CancellationToken::new();
//! let attempt = lifetime.child_with_timeout(Duration::from_secs(30));
//!
//! // Cancelling the parent cancels every child
//! lifetime.cancel();
//! assert!(attempt.is_cancelled());
//! ```

use crate::core::error::{PoolError, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Reason for cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancellationReason {
    /// Explicitly cancelled via `cancel()`
    Manual,
    /// The token's deadline passed; carries the configured timeout
    Timeout(Duration),
    /// Cancelled because the parent token was cancelled
    ParentCancelled,
    /// The owning pool is shutting down
    Shutdown,
    /// Custom cancellation reason
    Custom(String),
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationReason::Manual => write!(f, "manually cancelled"),
            CancellationReason::Timeout(d) => write!(f, "timeout after {:?}", d),
            CancellationReason::ParentCancelled => write!(f, "parent was cancelled"),
            CancellationReason::Shutdown => write!(f, "pool shutting down"),
            CancellationReason::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

struct Deadline {
    at: Instant,
    timeout: Duration,
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    deadline: Option<Deadline>,
    /// Child tokens (weak references to avoid cycles)
    children: RwLock<Vec<Weak<CancellationTokenInner>>>,
    /// First reason wins; written before `cancelled` is published
    reason: RwLock<Option<CancellationReason>>,
    signal: Mutex<()>,
    wakeup: Condvar,
}

impl CancellationTokenInner {
    fn new(deadline: Option<Deadline>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            deadline,
            children: RwLock::new(Vec::new()),
            reason: RwLock::new(None),
            signal: Mutex::new(()),
            wakeup: Condvar::new(),
        }
    }
}

impl std::fmt::Debug for CancellationTokenInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationTokenInner")
            .field("cancelled", &self.cancelled.load(Ordering::Relaxed))
            .field("deadline", &self.deadline.as_ref().map(|d| d.at))
            .field("children_count", &self.children.read().len())
            .field("reason", &*self.reason.read())
            .finish()
    }
}

/// A thread-safe, hierarchical cancellation token with an optional deadline
///
/// Deadlines are evaluated lazily: no timer thread is spawned, the token
/// notices an elapsed deadline the next time it is queried or while a task
/// sleeps on it.
///
/// # Example
///
/// ```rust
/// use rust_worker_pool::{CancellationToken, PoolError};
/// use std::time::Duration;
///
/// let token = CancellationToken::new().child_with_timeout(Duration::from_millis(10));
///
/// // A cooperative task body: sleep in small steps and bail out on expiry
/// let result = (|| -> Result<(), PoolError> {
///     for _ in 0..100 {
///         token.sleep(Duration::from_millis(1))?;
///     }
///     Ok(())
/// })();
///
/// assert!(matches!(result, Err(PoolError::DeadlineExceeded { .. })));
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl CancellationToken {
    /// Create a new root token (not cancelled, no deadline)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner::new(None)),
        }
    }

    /// Creates a child token linked to this parent
    ///
    /// The child inherits the parent's deadline and is cancelled when the
    /// parent is cancelled. If the parent is already cancelled, the child is
    /// created in a cancelled state.
    pub fn child(&self) -> Self {
        let deadline = self.inner.deadline.as_ref().map(|d| Deadline {
            at: d.at,
            timeout: d.timeout,
        });
        self.attach_child(deadline)
    }

    /// Creates a child token whose deadline is `timeout` from now
    ///
    /// The child is cancelled when the parent is cancelled or the timeout
    /// elapses, whichever happens first. A parent deadline that falls earlier
    /// still applies.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rust_worker_pool::CancellationToken;
    /// use std::time::Duration;
    ///
    /// let parent = CancellationToken::new();
    /// let child = parent.child_with_timeout(Duration::from_secs(30));
    ///
    /// parent.cancel();
    /// assert!(child.is_cancelled());
    /// ```
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        // A timeout too large to represent as an Instant never elapses
        let own = Instant::now()
            .checked_add(timeout)
            .map(|at| Deadline { at, timeout });
        let inherited = self.inner.deadline.as_ref().map(|d| Deadline {
            at: d.at,
            timeout: d.timeout,
        });
        let deadline = match (inherited, own) {
            (Some(parent), Some(own)) if parent.at < own.at => Some(parent),
            (_, Some(own)) => Some(own),
            (inherited, None) => inherited,
        };
        self.attach_child(deadline)
    }

    fn attach_child(&self, deadline: Option<Deadline>) -> Self {
        let child = CancellationToken {
            inner: Arc::new(CancellationTokenInner::new(deadline)),
        };

        {
            let mut children = self.inner.children.write();
            // Attempt tokens are short-lived; drop registrations of finished ones
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }

        // If parent already cancelled, cancel child immediately
        if self.is_cancelled() {
            child.cancel_with_reason(CancellationReason::ParentCancelled);
        }

        child
    }

    /// Cancel this token with default reason (Manual)
    ///
    /// Idempotent: only the first call sets the reason.
    pub fn cancel(&self) {
        self.cancel_with_reason(CancellationReason::Manual);
    }

    /// Cancel this token and all of its children with a specific reason
    pub fn cancel_with_reason(&self, reason: CancellationReason) {
        {
            let mut slot = self.inner.reason.write();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
            self.inner.cancelled.store(true, Ordering::Release);
        }

        {
            let _guard = self.inner.signal.lock();
            self.inner.wakeup.notify_all();
        }

        let children: Vec<_> = self
            .inner
            .children
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for child_inner in children {
            CancellationToken { inner: child_inner }
                .cancel_with_reason(CancellationReason::ParentCancelled);
        }
    }

    /// Check if this token has been cancelled or its deadline has passed
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match &self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline.at => {
                self.cancel_with_reason(CancellationReason::Timeout(deadline.timeout));
                true
            }
            _ => false,
        }
    }

    /// Returns the cancellation reason (if cancelled)
    pub fn reason(&self) -> Option<CancellationReason> {
        self.inner.reason.read().clone()
    }

    /// Whether the token was cancelled because its deadline passed
    pub fn deadline_exceeded(&self) -> bool {
        self.is_cancelled() && matches!(self.reason(), Some(CancellationReason::Timeout(_)))
    }

    /// The absolute deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline.as_ref().map(|d| d.at)
    }

    /// Time left until the deadline; `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Returns an error if cancelled, `Ok(())` otherwise
    ///
    /// An elapsed deadline maps to [`PoolError::DeadlineExceeded`], any
    /// other reason to [`PoolError::Cancelled`], so task bodies can simply
    /// use `ctx.check()?`.
    pub fn check(&self) -> Result<()> {
        if !self.is_cancelled() {
            return Ok(());
        }
        match self.reason() {
            Some(CancellationReason::Timeout(timeout)) => {
                Err(PoolError::deadline_exceeded(timeout.as_millis() as u64))
            }
            Some(reason) => Err(PoolError::cancelled(reason.to_string())),
            None => Err(PoolError::cancelled("unknown")),
        }
    }

    /// Sleeps for `duration`, returning early with the [`check()`](Self::check)
    /// error if the token is cancelled or its deadline passes first
    pub fn sleep(&self, duration: Duration) -> Result<()> {
        let until = Instant::now().checked_add(duration);
        loop {
            self.check()?;
            if until.is_some_and(|until| Instant::now() >= until) {
                return Ok(());
            }
            let wake_at = match (self.deadline(), until) {
                (Some(deadline), Some(until)) => Some(deadline.min(until)),
                (deadline, until) => deadline.or(until),
            };

            let mut guard = self.inner.signal.lock();
            if self.inner.cancelled.load(Ordering::Acquire) {
                continue;
            }
            match wake_at {
                Some(wake_at) => {
                    self.inner.wakeup.wait_until(&mut guard, wake_at);
                }
                None => self.inner.wakeup.wait(&mut guard),
            }
        }
    }

    #[cfg(test)]
    fn registered_children(&self) -> usize {
        self.inner.children.read().len()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
