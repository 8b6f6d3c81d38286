//! # Deferred: a single-assignment value settled from outside.
//!
//! [`Deferred`] is the contract the layered utilities ([`Cancellable`](crate::Cancellable),
//! [`Delay`](crate::Delay)) are built on. Any clone may settle it, any number of
//! tasks may await it, before or after settlement.
//!
//! ## Rules
//! - **Single assignment**: the first `resolve`/`reject` wins; later calls return
//!   `false` and change nothing.
//! - **Late waiters**: `wait()` on a settled value completes immediately.
//! - **No implicit rejection**: dropping every handle of a pending value simply leaves
//!   nobody waiting; there is no "abandoned" outcome.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::DeferredError;

#[derive(Clone)]
enum Settlement<T, E> {
    Pending,
    Resolved(T),
    Rejected(E),
}

struct Inner<T, E> {
    state: Mutex<Settlement<T, E>>,
    settled: Notify,
}

/// Cloneable handle to a value that is resolved or rejected exactly once.
///
/// ## Example
/// ```rust
/// use tidings::{Deferred, DeferredError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let d: Deferred<u32, &str> = Deferred::new();
/// let waiter = d.clone();
/// let task = tokio::spawn(async move { waiter.wait().await });
///
/// assert!(d.resolve(7));
/// assert!(!d.reject("too late"));
/// assert_eq!(task.await.unwrap(), Ok(7));
/// assert_eq!(d.result(), Some(7));
/// # }
/// ```
pub struct Deferred<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Creates a pending value.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(Settlement::Pending),
                settled: Notify::new(),
            }),
        }
    }

    /// Settles with `value` if still pending.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Settlement::Resolved(value))
    }

    /// Settles with `error` if still pending.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Settlement::Rejected(error))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.inner.state.lock(), Settlement::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(*self.inner.state.lock(), Settlement::Rejected(_))
    }

    pub fn is_settled(&self) -> bool {
        !matches!(*self.inner.state.lock(), Settlement::Pending)
    }

    fn settle(&self, outcome: Settlement<T, E>) -> bool {
        {
            let mut state = self.inner.state.lock();
            if !matches!(*state, Settlement::Pending) {
                return false;
            }
            *state = outcome;
        }
        self.inner.settled.notify_waiters();
        true
    }
}

impl<T: Clone, E: Clone> Deferred<T, E> {
    /// The resolved value, if any.
    pub fn result(&self) -> Option<T> {
        match &*self.inner.state.lock() {
            Settlement::Resolved(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<E> {
        match &*self.inner.state.lock() {
            Settlement::Rejected(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// The outcome if settled, without waiting.
    pub fn settled(&self) -> Option<Result<T, E>> {
        match &*self.inner.state.lock() {
            Settlement::Pending => None,
            Settlement::Resolved(v) => Some(Ok(v.clone())),
            Settlement::Rejected(e) => Some(Err(e.clone())),
        }
    }

    /// Waits for settlement.
    ///
    /// Returns the resolved value, or [`DeferredError::Rejected`] with the rejection.
    pub async fn wait(&self) -> Result<T, DeferredError<E>> {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            // register before checking so a settle in between is not missed
            notified.as_mut().enable();

            if let Some(outcome) = self.settled() {
                return outcome.map_err(DeferredError::Rejected);
            }
            notified.await;
        }
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.inner.state.lock() {
            Settlement::Pending => "pending",
            Settlement::Resolved(_) => "resolved",
            Settlement::Rejected(_) => "rejected",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_settlement_wins() {
        let d: Deferred<u8, &str> = Deferred::new();
        assert!(!d.is_settled());
        assert!(d.reject("no"));
        assert!(!d.resolve(1));
        assert!(!d.reject("again"));

        assert!(d.is_rejected());
        assert!(!d.is_resolved());
        assert_eq!(d.rejection(), Some("no"));
        assert_eq!(d.result(), None);
    }

    #[tokio::test]
    async fn test_wait_after_settlement_completes_immediately() {
        let d: Deferred<u8, ()> = Deferred::new();
        d.resolve(5);
        assert_eq!(d.wait().await, Ok(5));
        assert_eq!(d.wait().await, Ok(5));
    }

    #[tokio::test]
    async fn test_many_waiters_see_rejection() {
        let d: Deferred<(), String> = Deferred::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let d = d.clone();
                tokio::spawn(async move { d.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        d.reject("boom".to_string());

        for w in waiters {
            assert_eq!(
                w.await.unwrap(),
                Err(DeferredError::Rejected("boom".to_string()))
            );
        }
    }

    #[test]
    fn test_clones_share_state() {
        let a: Deferred<u8, ()> = Deferred::new();
        let b = a.clone();
        b.resolve(9);
        assert_eq!(a.settled(), Some(Ok(9)));
        assert_eq!(format!("{a:?}"), "Deferred { state: \"resolved\" }");
    }
}
