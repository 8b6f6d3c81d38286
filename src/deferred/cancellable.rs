//! # Cancellable: a cancellation flag that remembers why.
//!
//! [`Cancellable`] pairs a [`Deferred`] reason with a
//! [`CancellationToken`] so that tokio code can `select!` on it the usual way.
//!
//! ## Rules
//! - The first `cancel(reason)` wins; later calls return `false`.
//! - [`Cancellable::token`] hands out **child** tokens: cancelling one of them does
//!   not cancel the flag (it has no reason to record).

use std::fmt;

use tokio_util::sync::CancellationToken;

use super::value::Deferred;
use crate::error::CancelError;

/// Cloneable cancellation flag carrying a reason of type `R`.
///
/// ## Example
/// ```rust
/// use tidings::Cancellable;
///
/// let flag: Cancellable<&str> = Cancellable::new();
/// assert!(flag.check().is_ok());
///
/// assert!(flag.cancel("shutdown"));
/// assert!(!flag.cancel("ignored"));
/// assert_eq!(flag.reason(), Some("shutdown"));
/// assert!(flag.check().is_err());
/// ```
pub struct Cancellable<R> {
    reason: Deferred<R, std::convert::Infallible>,
    token: CancellationToken,
}

impl<R> Cancellable<R> {
    /// Creates a flag that is not cancelled.
    pub fn new() -> Self {
        Self {
            reason: Deferred::new(),
            token: CancellationToken::new(),
        }
    }

    /// Requests cancellation with `reason`.
    ///
    /// Returns `false` if the flag was already cancelled.
    pub fn cancel(&self, reason: R) -> bool {
        if !self.reason.resolve(reason) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason.is_resolved()
    }

    /// A child token that is cancelled together with this flag.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

impl<R: Clone> Cancellable<R> {
    /// The cancellation reason, if cancelled.
    pub fn reason(&self) -> Option<R> {
        self.reason.result()
    }

    /// `Ok(())` while not cancelled, [`CancelError::Cancelled`] afterwards.
    pub fn check(&self) -> Result<(), CancelError<R>> {
        match self.reason() {
            Some(r) => Err(CancelError::Cancelled(r)),
            None => Ok(()),
        }
    }

    /// Waits until cancelled and returns the reason.
    pub async fn cancelled(&self) -> R {
        match self.reason.wait().await {
            Ok(r) => r,
            Err(e) => match e.into_inner() {},
        }
    }
}

impl<R> Clone for Cancellable<R> {
    fn clone(&self) -> Self {
        Self {
            reason: self.reason.clone(),
            token: self.token.clone(),
        }
    }
}

impl<R> Default for Cancellable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Cancellable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellable")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
