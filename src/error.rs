//! Error types used by the layered primitives.
//!
//! The core channel and stream never produce library errors of their own:
//! - a panicking handler unwinds straight to the caller of `emit`;
//! - a stream abort reason is the caller's own type, yielded as `Err(reason)`;
//! - producing after termination is a silent no-op.
//!
//! The enums here belong to the utilities built on top of [`Deferred`](crate::Deferred):
//!
//! - [`DeferredError`]: a deferred value was rejected.
//! - [`CancelError`]: work was cancelled with a reason.
//! - [`DelayError`]: a timer was aborted before its deadline.
//!
//! Each type provides `as_label` for logs/metrics, same as elsewhere in the crate.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced when awaiting a [`Deferred`](crate::Deferred).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeferredError<E> {
    /// The deferred value was rejected with the contained error.
    #[error("deferred value rejected: {0:?}")]
    Rejected(E),
}

impl<E> DeferredError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tidings::DeferredError;
    ///
    /// let err = DeferredError::Rejected("nope");
    /// assert_eq!(err.as_label(), "deferred_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeferredError::Rejected(_) => "deferred_rejected",
        }
    }

    /// Consumes the error and returns the rejection value.
    pub fn into_inner(self) -> E {
        match self {
            DeferredError::Rejected(e) => e,
        }
    }
}

/// # Error returned by [`Cancellable::check`](crate::Cancellable::check).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CancelError<R> {
    /// Cancellation was requested with the contained reason.
    #[error("cancelled: {0:?}")]
    Cancelled(R),
}

impl<R> CancelError<R> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CancelError::Cancelled(_) => "cancelled",
        }
    }

    /// Returns the cancellation reason.
    pub fn reason(&self) -> &R {
        match self {
            CancelError::Cancelled(r) => r,
        }
    }
}

/// # Errors produced by [`Delay`](crate::Delay).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayError {
    /// The delay was aborted before its deadline passed.
    #[error("delay aborted after {elapsed:?}")]
    Aborted {
        /// Time elapsed since the delay was created.
        elapsed: Duration,
    },
}

impl DelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tidings::DelayError;
    /// use std::time::Duration;
    ///
    /// let err = DelayError::Aborted { elapsed: Duration::from_millis(5) };
    /// assert_eq!(err.as_label(), "delay_aborted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DelayError::Aborted { .. } => "delay_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DelayError::Aborted { elapsed } => format!("aborted after {elapsed:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(DeferredError::Rejected(1).as_label(), "deferred_rejected");
        assert_eq!(CancelError::Cancelled("x").as_label(), "cancelled");
        let delay = DelayError::Aborted {
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(delay.as_label(), "delay_aborted");
        assert_eq!(delay.as_message(), "aborted after 1s");
    }

    #[test]
    fn test_display_includes_payload() {
        let err = DeferredError::Rejected("boom");
        assert_eq!(err.to_string(), "deferred value rejected: \"boom\"");
        assert_eq!(err.into_inner(), "boom");

        let err = CancelError::Cancelled(7u8);
        assert_eq!(*err.reason(), 7);
        assert_eq!(err.to_string(), "cancelled: 7");
    }
}
