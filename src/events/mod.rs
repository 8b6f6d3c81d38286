//! Synchronous event channel: subscription nodes, the ordered list, and the public surface.
//!
//! This module groups the **data model** of subscriptions and the **channel**
//! that dispatches events to them.
//!
//! ## Contents
//! - [`Handler`], [`handler`] shared callback type and its constructor
//! - [`SubscriptionId`], [`Mode`] subscription handle and delivery mode
//! - [`EventChannel`] subscribe / unsubscribe / emit surface
//!
//! ## Quick reference
//! - **Subscribe**: `subscribe(h)`, `subscribe_method(&inst, T::method)`, and the
//!   `_once` variants.
//! - **Unsubscribe**: `unsubscribe(&h)` (first exact handler), `unsubscribe_instance(&inst)`
//!   (every node of the instance), `unsubscribe_method(&inst, T::method)` (first exact pair),
//!   `remove(id)`.
//! - **Emit**: `emit(&ev)` runs handlers inline, in subscription order.

mod channel;
mod list;
mod node;

pub use channel::EventChannel;
pub use node::{handler, Handler, Mode, SubscriptionId};
