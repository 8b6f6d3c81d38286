//! Layered primitives built on a single-assignment value.
//!
//! ## Contents
//! - [`Deferred`] value resolved or rejected exactly once, awaitable by many
//! - [`Cancellable`] cancellation flag with a reason, bridged to `CancellationToken`
//! - [`Delay`] adjustable one-shot timer _(feature `time`)_
//!
//! None of these are used by the event channel or the broadcast stream; they share
//! the crate's conventions (first settlement wins, late waiters complete at once).

mod cancellable;
#[cfg(feature = "time")]
mod delay;
mod value;

pub use cancellable::Cancellable;
#[cfg(feature = "time")]
pub use delay::Delay;
pub use value::Deferred;
