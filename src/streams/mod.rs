//! Async broadcast stream: chunk chain, producer handle and consumer cursors.
//!
//! ## Contents
//! - [`StreamState`] lifecycle derived from the chunk chain
//! - [`BroadcastStream`] producer side (`emit` / `close` / `abort`)
//! - [`Chunks`], [`AbortPolicy`] consumer side (`iterate(policy)`)
//!
//! ## Lifecycle
//! ```text
//!            emit(v)
//!           ┌──────┐
//!           ▼      │
//!        ┌────────────┐  close()   ┌──────────┐
//!        │    Open    │──────────► │  Closed  │
//!        └─────┬──────┘            └──────────┘
//!              │ abort(e)          ┌──────────┐
//!              └─────────────────► │ Aborted  │
//!                                  └──────────┘
//!   any producer call in Closed/Aborted: ignored, returns false
//! ```

mod broadcast;
mod chunk;
mod cursor;

pub use broadcast::BroadcastStream;
pub use chunk::StreamState;
pub use cursor::{AbortPolicy, Chunks};
