//! # Subscription nodes: one delivery target plus a delivery mode.
//!
//! A node is created by `subscribe*` and owned exclusively by the
//! [`SubscriptionList`](super::list::SubscriptionList). Two target shapes exist:
//!
//! ```text
//! Target::Handler(h)                         plain callback, matched by Arc identity
//! Target::Bound { instance, method, call }   instance + method, `call` is the bound wrapper
//! ```
//!
//! ## Rules
//! - A bound node never matches a bare handler: it stores its own wrapper closure,
//!   so the caller has no `Arc` that could compare equal to it.
//! - Handlers and instances are identified by `Arc` data address; values are
//!   never compared.
//! - Methods are identified by the [`TypeId`] of the callable. Every fn item and
//!   every closure has its own zero-sized type, so two methods never share a key even
//!   when the compiler merges their bodies into one address.
//! - `Mode::Once` nodes are unlinked when claimed for delivery.

use std::any::TypeId;
use std::mem;
use std::sync::Arc;

/// Shared callback invoked with a reference to each emitted event.
///
/// Keep a clone of the `Arc` to unsubscribe later: removal matches by pointer identity.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Wraps a closure into a [`Handler`].
///
/// ## Example
/// ```rust
/// use tidings::{handler, EventChannel};
///
/// let chan = EventChannel::<u32>::new();
/// let h = handler(|n: &u32| println!("got {n}"));
/// chan.subscribe(h.clone());
/// assert!(chan.unsubscribe(&h));
/// ```
pub fn handler<E, F>(f: F) -> Handler<E>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Stable handle of one subscription inside a channel.
///
/// Ids increase monotonically per channel and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value (for logs).
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Delivery mode of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Delivered on every emit until removed.
    #[default]
    Recurring,
    /// Delivered once, then removed.
    Once,
}

/// Delivery target of a node.
pub(crate) enum Target<E> {
    Handler(Handler<E>),
    Bound {
        instance: usize,
        method: TypeId,
        call: Handler<E>,
    },
}

impl<E> Clone for Target<E> {
    fn clone(&self) -> Self {
        match self {
            Target::Handler(h) => Target::Handler(Arc::clone(h)),
            Target::Bound {
                instance,
                method,
                call,
            } => Target::Bound {
                instance: *instance,
                method: *method,
                call: Arc::clone(call),
            },
        }
    }
}

impl<E: 'static> Target<E> {
    /// Binds `method` to `instance`; the node keeps the instance alive.
    pub(crate) fn bind<I, F>(instance: &Arc<I>, method: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&I, &E) + Copy + Send + Sync + 'static,
    {
        let bound = Arc::clone(instance);
        Target::Bound {
            instance: instance_key(instance),
            method: method_key::<F>(),
            call: Arc::new(move |ev: &E| method(&*bound, ev)),
        }
    }
}

impl<E> Target<E> {
    /// Invokes the target. Panics from the callback are not caught.
    #[inline]
    pub(crate) fn deliver(&self, ev: &E) {
        match self {
            Target::Handler(h) => h(ev),
            Target::Bound { call, .. } => call(ev),
        }
    }

    fn matches(&self, m: &Matcher) -> bool {
        match (self, m) {
            (Target::Handler(h), Matcher::Handler(key)) => handler_key(h) == *key,
            (Target::Bound { instance, .. }, Matcher::Instance(key)) => instance == key,
            (
                Target::Bound {
                    instance, method, ..
                },
                Matcher::Method {
                    instance: ik,
                    method: mk,
                },
            ) => instance == ik && method == mk,
            _ => false,
        }
    }
}

/// Removal criterion for [`SubscriptionList::remove_first`](super::list::SubscriptionList::remove_first)
/// and [`SubscriptionList::remove_all`](super::list::SubscriptionList::remove_all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Matcher {
    Id(SubscriptionId),
    Handler(usize),
    Instance(usize),
    Method { instance: usize, method: TypeId },
}

impl Matcher {
    pub(crate) fn handler<E>(h: &Handler<E>) -> Self {
        Matcher::Handler(handler_key(h))
    }

    pub(crate) fn instance<I: ?Sized>(instance: &Arc<I>) -> Self {
        Matcher::Instance(instance_key(instance))
    }

    pub(crate) fn method<I: ?Sized, F: 'static>(instance: &Arc<I>, _method: &F) -> Self {
        Matcher::Method {
            instance: instance_key(instance),
            method: method_key::<F>(),
        }
    }
}

/// One record of the subscription list.
pub(crate) struct Node<E> {
    pub(crate) id: SubscriptionId,
    pub(crate) target: Target<E>,
    pub(crate) mode: Mode,
}

impl<E> Node<E> {
    #[inline]
    pub(crate) fn matches(&self, m: &Matcher) -> bool {
        match m {
            Matcher::Id(id) => self.id == *id,
            other => self.target.matches(other),
        }
    }
}

fn handler_key<E>(h: &Handler<E>) -> usize {
    Arc::as_ptr(h).cast::<()>() as usize
}

fn instance_key<I: ?Sized>(instance: &Arc<I>) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}

/// Rejects callables that carry data (fn pointers, capturing closures) at compile time:
/// all `fn(&I, &E)` pointers share one type, so their `TypeId` cannot tell them apart.
struct StatelessMethod<F>(std::marker::PhantomData<F>);

impl<F> StatelessMethod<F> {
    const CHECK: () = assert!(
        mem::size_of::<F>() == 0,
        "bind a method path (`Type::method`) or a non-capturing closure, not a fn pointer"
    );
}

fn method_key<F: 'static>() -> TypeId {
    let () = StatelessMethod::<F>::CHECK;
    TypeId::of::<F>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl Counter {
        fn on_a(&self, _: &u8) {}
        fn on_b(&self, _: &u8) {}
    }

    #[test]
    fn test_handler_matches_by_identity_only() {
        let a: Handler<u8> = handler(|_| {});
        let b: Handler<u8> = handler(|_| {});
        let node = Node {
            id: SubscriptionId::new(0),
            target: Target::Handler(Arc::clone(&a)),
            mode: Mode::Recurring,
        };
        assert!(node.matches(&Matcher::handler(&a)));
        assert!(!node.matches(&Matcher::handler(&b)));
        assert!(node.matches(&Matcher::Id(SubscriptionId::new(0))));
    }

    #[test]
    fn test_bound_target_matches_instance_and_pair() {
        let one = Arc::new(Counter);
        let two = Arc::new(Counter);
        let node = Node {
            id: SubscriptionId::new(3),
            target: Target::<u8>::bind(&one, Counter::on_a),
            mode: Mode::Once,
        };

        assert!(node.matches(&Matcher::instance(&one)));
        assert!(!node.matches(&Matcher::instance(&two)));
        assert!(node.matches(&Matcher::method(&one, &Counter::on_a)));
        assert!(!node.matches(&Matcher::method(&one, &Counter::on_b)));
        assert!(!node.matches(&Matcher::method(&two, &Counter::on_a)));
    }

    #[test]
    fn test_bound_target_never_matches_handler() {
        let one = Arc::new(Counter);
        let target = Target::<u8>::bind(&one, Counter::on_a);
        let call = match &target {
            Target::Bound { call, .. } => Arc::clone(call),
            Target::Handler(_) => unreachable!(),
        };
        let node = Node {
            id: SubscriptionId::new(1),
            target,
            mode: Mode::Recurring,
        };
        assert!(!node.matches(&Matcher::handler(&call)));
    }
}
