//! # tidings
//!
//! **Tidings** provides two in-process multicast primitives for Rust:
//! a synchronous [`EventChannel`] and an asynchronous [`BroadcastStream`].
//!
//! Both stay correct while they are being mutated from inside their own delivery
//! (handlers that unsubscribe, consumers that attach mid-stream) and define precise
//! ordering and termination rules. A few small utilities built on a single-assignment
//! [`Deferred`] value ship alongside them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────────────────── EventChannel<E> ───────────────────────────────┐
//!  │ subscribe(h) / subscribe_method(&inst, T::m) / *_once / unsubscribe*(..)   │
//!  │                                                                            │
//!  │   SubscriptionList (ordered by SubscriptionId)                             │
//!  │   [0: h1 Recurring] ─► [1: inst.m Recurring] ─► [2: h3 Once] ─► ...        │
//!  │          ▲                                                                 │
//!  │   emit(&ev): forward cursor (last visited id), re-read after each call     │
//!  └────────────────────────────────────────────────────────────────────────────┘
//!
//!  ┌─────────────────────────── BroadcastStream<T, E> ──────────────────────────┐
//!  │ emit(v) / close() / abort(e)                                               │
//!  │                                                                            │
//!  │   Chain:  Start ─► Data(1) ─► Data(2) ─► Data(3) ─► Close ◄┐ (self)        │
//!  │                        ▲                   ▲          └────┘               │
//!  │             cursor A (attached at 0)   cursor B (attached at 2)            │
//!  │                                                                            │
//!  │   iterate(policy) ─► Chunks: impl Stream<Item = Result<T, E>>              │
//!  └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Delivery
//! ```text
//! EventChannel::emit(&ev)
//!   ├─► claim next node after cursor (once nodes unlinked here)
//!   ├─► call handler outside the lock (panics unwind to the caller)
//!   └─► repeat until no node follows the cursor
//!
//! Chunks::next()
//!   ├─► Immediate && aborted      ─► Err(reason), fused
//!   ├─► next chunk resolved       ─► Data: Ok(v) | Close: None | Error: Err(reason)
//!   └─► not yet                   ─► await the chain length watch
//! ```
//!
//! ## Features
//! | Area                 | Description                                                  | Key types                                  |
//! |----------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Event channel**    | Synchronous, ordered multicast with identity-based removal.  | [`EventChannel`], [`Handler`], [`Mode`]    |
//! | **Broadcast stream** | Async multicast, late attach, two abort policies.            | [`BroadcastStream`], [`Chunks`], [`AbortPolicy`] |
//! | **Deferred values**  | Resolve/reject once, await from anywhere.                    | [`Deferred`], [`Cancellable`]              |
//! | **Timers**           | Adjustable, abortable one-shot delay.                        | [`Delay`]                                  |
//! | **Errors**           | Typed errors for the layered utilities.                      | [`DeferredError`], [`DelayError`]          |
//! | **Configuration**    | Preallocation hints.                                         | [`Config`]                                 |
//!
//! ## Optional features
//! - `time` _(default)_: exports [`Delay`] (pulls in tokio's timer).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use tidings::{handler, AbortPolicy, BroadcastStream, EventChannel};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Synchronous channel
//!     let chan = EventChannel::<String>::new();
//!     let printer = handler(|ev: &String| println!("event: {ev}"));
//!     chan.subscribe(Arc::clone(&printer));
//!     chan.emit(&"ready".to_string());
//!     chan.unsubscribe(&printer);
//!
//!     // Async broadcast stream
//!     let stream = BroadcastStream::<u32, String>::new();
//!     let a = stream.iterate(AbortPolicy::InOrder);
//!     stream.emit(1);
//!     stream.emit(2);
//!     let b = stream.iterate(AbortPolicy::InOrder);
//!     stream.emit(3);
//!     stream.close();
//!
//!     let a: Vec<_> = a.collect().await;
//!     let b: Vec<_> = b.collect().await;
//!     assert_eq!(a, vec![Ok(1), Ok(2), Ok(3)]);
//!     assert_eq!(b, vec![Ok(3)]);
//! }
//! ```
mod config;
mod deferred;
mod error;
mod events;
mod streams;

// ---- Public re-exports ----

pub use config::Config;
pub use deferred::{Cancellable, Deferred};
pub use error::{CancelError, DeferredError, DelayError};
pub use events::{handler, EventChannel, Handler, Mode, SubscriptionId};
pub use streams::{AbortPolicy, BroadcastStream, Chunks, StreamState};

// Optional: adjustable one-shot timer.
// Enabled by default via the `time` feature.
#[cfg(feature = "time")]
pub use deferred::Delay;
