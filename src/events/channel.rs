//! # EventChannel: synchronous multicast of events to subscribed handlers.
//!
//! [`EventChannel`] calls every live subscription **inline**, in subscription order,
//! from inside [`EventChannel::emit`].
//!
//! ## What it guarantees
//! - Handlers run in the order they subscribed.
//! - `subscribe_once` handlers run at most once, even if they re-emit on the same channel.
//! - Handlers may subscribe/unsubscribe (on this or any channel) while being called;
//!   the internal lock is never held during a handler call.
//!
//! ## What it does **not** guarantee
//! - No buffering: events emitted with no subscribers are gone, and late subscribers
//!   never see earlier events.
//! - No isolation: a panicking handler unwinds through `emit` and the remaining
//!   handlers of that pass are not called.
//! - A handler subscribed during a pass may or may not receive the in-flight event.
//!
//! ## Diagram
//! ```text
//!    emit(&ev)
//!       │  cursor = None
//!       ├──► lock ─► claim_after(cursor) ─► unlock ─► target.deliver(&ev)   node 0
//!       ├──► lock ─► claim_after(cursor) ─► unlock ─► target.deliver(&ev)   node 1 (once: unlinked)
//!       └──► lock ─► claim_after(cursor) ─► None ─► done
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tidings::{handler, EventChannel};
//!
//! let chan = EventChannel::<&'static str>::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let h = {
//!     let hits = Arc::clone(&hits);
//!     handler(move |_ev: &&str| { hits.fetch_add(1, Ordering::Relaxed); })
//! };
//! chan.subscribe(h.clone());
//! chan.subscribe_once(h.clone());
//!
//! chan.emit(&"x"); // both nodes fire
//! chan.emit(&"y"); // only the recurring node fires
//! assert_eq!(hits.load(Ordering::Relaxed), 3);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::list::SubscriptionList;
use super::node::{Handler, Matcher, Mode, SubscriptionId, Target};
use crate::config::Config;

/// Multicast event channel with synchronous, in-order delivery.
///
/// ### Properties
/// - **Inline**: `emit` returns after every reachable handler ran.
/// - **Identity-based removal**: handlers by `Arc` pointer, instances by `Arc` pointer,
///   methods by the type of the method path (`Type::method`).
/// - **Shareable**: `Send + Sync`; wrap it in an `Arc` to hand it to handlers.
pub struct EventChannel<E> {
    list: Mutex<SubscriptionList<E>>,
}

impl<E> EventChannel<E> {
    /// Creates a channel with default [`Config`].
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates a channel, preallocating `subscriber_capacity` node records.
    pub fn with_config(cfg: &Config) -> Self {
        let cap = cfg.subscriber_reservation().unwrap_or(0);
        Self {
            list: Mutex::new(SubscriptionList::with_capacity(cap)),
        }
    }

    /// Subscribes a handler for every subsequent event.
    pub fn subscribe(&self, handler: Handler<E>) -> SubscriptionId {
        self.push(Target::Handler(handler), Mode::Recurring)
    }

    /// Subscribes a handler for the next event only.
    pub fn subscribe_once(&self, handler: Handler<E>) -> SubscriptionId {
        self.push(Target::Handler(handler), Mode::Once)
    }

    /// Removes the first subscription of exactly this handler.
    ///
    /// Only plain-handler subscriptions can match; method subscriptions are
    /// removed with [`unsubscribe_instance`](Self::unsubscribe_instance) or
    /// [`unsubscribe_method`](Self::unsubscribe_method).
    ///
    /// Returns `true` if a subscription was removed.
    pub fn unsubscribe(&self, handler: &Handler<E>) -> bool {
        self.remove_first(Matcher::handler(handler))
    }

    /// Removes **every** method subscription bound to `instance`.
    ///
    /// Returns the number of removed subscriptions.
    pub fn unsubscribe_instance<I>(&self, instance: &Arc<I>) -> usize
    where
        I: ?Sized,
    {
        let removed = self.list.lock().remove_all(&Matcher::instance(instance));
        trace!(removed, "instance unsubscribed");
        removed
    }

    /// Removes the first subscription of `method` bound to `instance`.
    ///
    /// `method` must name the same method path used to subscribe.
    /// Returns `true` if a subscription was removed.
    pub fn unsubscribe_method<I, F>(&self, instance: &Arc<I>, method: F) -> bool
    where
        I: ?Sized,
        F: Fn(&I, &E) + 'static,
    {
        self.remove_first(Matcher::method(instance, &method))
    }

    /// Delivery mode of a live subscription, `None` once it is gone.
    ///
    /// A `Mode::Once` subscription disappears as soon as an emit claims it.
    pub fn mode(&self, id: SubscriptionId) -> Option<Mode> {
        self.list.lock().mode_of(id)
    }

    /// Removes the subscription with this id, if it is still live.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.remove_first(Matcher::Id(id))
    }

    /// Removes every subscription.
    pub fn clear(&self) -> usize {
        self.list.lock().clear()
    }

    /// Delivers `event` to every live subscription, in subscription order.
    ///
    /// Returns the number of deliveries made.
    ///
    /// ### Panics
    /// Propagates any panic raised by a handler; handlers after it are not called
    /// for this event.
    pub fn emit(&self, event: &E) -> usize {
        let mut cursor = None;
        let mut delivered = 0usize;

        loop {
            let claimed = self.list.lock().claim_after(cursor);
            let Some((id, target)) = claimed else { break };
            cursor = Some(id);
            target.deliver(event);
            delivered += 1;
        }

        trace!(delivered, "event emitted");
        delivered
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    /// True if there are no live subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.lock().is_empty()
    }

    fn push(&self, target: Target<E>, mode: Mode) -> SubscriptionId {
        let id = self.list.lock().push(target, mode);
        trace!(id = id.as_u64(), ?mode, "subscribed");
        id
    }

    fn remove_first(&self, m: Matcher) -> bool {
        let removed = self.list.lock().remove_first(&m);
        if let Some(id) = removed {
            trace!(id = id.as_u64(), "unsubscribed");
        }
        removed.is_some()
    }
}

impl<E: 'static> EventChannel<E> {
    /// Subscribes `method` bound to `instance` for every subsequent event.
    ///
    /// The channel keeps a clone of the `Arc` until the subscription is removed.
    /// `method` is a method path (`Type::method`) or a non-capturing closure; it is
    /// identified by its type, so fn pointers are rejected at compile time.
    pub fn subscribe_method<I, F>(&self, instance: &Arc<I>, method: F) -> SubscriptionId
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&I, &E) + Copy + Send + Sync + 'static,
    {
        self.push(Target::bind(instance, method), Mode::Recurring)
    }

    /// Subscribes `method` bound to `instance` for the next event only.
    pub fn subscribe_once_method<I, F>(&self, instance: &Arc<I>, method: F) -> SubscriptionId
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&I, &E) + Copy + Send + Sync + 'static,
    {
        self.push(Target::bind(instance, method), Mode::Once)
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscriptions", &self.len())
            .finish()
    }
}
