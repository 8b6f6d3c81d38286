//! # Chunks: one consumer's lazy view of a broadcast stream.
//!
//! Every call to [`BroadcastStream::iterate`](crate::BroadcastStream::iterate) creates a
//! [`Chunks`] with a private cursor positioned at the chain's tail **at that moment**.
//! Consumers never share cursors and never affect each other or the producer.
//!
//! ## Cursor loop
//! ```text
//! loop {
//!   ├─► Immediate policy && stream aborted ─► yield Err(reason), fuse
//!   ├─► next of current chunk resolved?
//!   │       ├─ Data(v)  ─► advance, yield Ok(v)
//!   │       ├─ Close    ─► fuse (end of sequence)
//!   │       └─ Error(e) ─► yield Err(e), fuse
//!   └─► not yet ─► await chain length > position + 1 (watch channel)
//! }
//! ```
//!
//! ## Rules
//! - Items arrive in append order; a cursor never skips or repeats a chunk.
//! - After the terminal item the sequence is fused: it only returns `None`.
//! - Dropping a [`Chunks`] is the only way to cancel a consumer; nothing else changes.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::watch;

use super::broadcast::Shared;
use super::chunk::Chunk;

/// How a consumer reacts to an abort that happens while data is still buffered ahead of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortPolicy {
    /// Yield every data chunk appended before the error marker, then the reason.
    #[default]
    InOrder,
    /// Yield the reason as soon as the stream is seen aborted, dropping unyielded data.
    Immediate,
}

/// Private cursor state driven by [`Chunks`].
struct Cursor<T, E> {
    shared: Arc<Shared<T, E>>,
    tail_rx: watch::Receiver<usize>,
    pos: usize,
    policy: AbortPolicy,
    done: bool,
}

impl<T: Clone, E: Clone> Cursor<T, E> {
    async fn advance(&mut self) -> Option<Result<T, E>> {
        while !self.done {
            {
                let chain = self.shared.chain.lock();

                if self.policy == AbortPolicy::Immediate {
                    if let Some(reason) = chain.abort_reason() {
                        self.done = true;
                        return Some(Err(reason.clone()));
                    }
                }

                if let Some(next) = chain.next_of(self.pos) {
                    self.pos = next;
                    match &chain[next] {
                        Chunk::Data(v) => return Some(Ok(v.clone())),
                        Chunk::Error(e) => {
                            self.done = true;
                            return Some(Err(e.clone()));
                        }
                        Chunk::Close => {
                            self.done = true;
                            return None;
                        }
                        Chunk::Start => continue,
                    }
                }
            }

            let pos = self.pos;
            if self.tail_rx.wait_for(|&len| len > pos + 1).await.is_err() {
                self.done = true;
            }
        }
        None
    }
}

/// Lazy, single-pass sequence of a broadcast stream's payloads.
///
/// Implements [`Stream`] with `Item = Result<T, E>`: `Ok` for each payload, one `Err`
/// carrying the abort reason if the stream is aborted, and `None` after termination.
///
/// ## Example
/// ```rust
/// use futures::StreamExt;
/// use tidings::{AbortPolicy, BroadcastStream};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let stream = BroadcastStream::<u32, String>::new();
/// let early = stream.iterate(AbortPolicy::InOrder);
/// stream.emit(1);
/// let late = stream.iterate(AbortPolicy::InOrder);
/// stream.emit(2);
/// stream.close();
///
/// let early: Vec<_> = early.collect().await;
/// let late: Vec<_> = late.collect().await;
/// assert_eq!(early, vec![Ok(1), Ok(2)]);
/// assert_eq!(late, vec![Ok(2)]);
/// # }
/// ```
pub struct Chunks<T, E> {
    policy: AbortPolicy,
    inner: BoxStream<'static, Result<T, E>>,
}

impl<T, E> Chunks<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Attaches a new cursor at the current tail of `shared`.
    pub(crate) fn attach(shared: Arc<Shared<T, E>>, policy: AbortPolicy) -> Self {
        let tail_rx = shared.tail_tx.subscribe();
        let pos = shared.chain.lock().tail();
        let cursor = Cursor {
            shared,
            tail_rx,
            pos,
            policy,
            done: false,
        };

        let inner = stream::unfold(cursor, |mut cursor| async move {
            let item = cursor.advance().await?;
            Some((item, cursor))
        })
        .fuse();

        Self {
            policy,
            inner: Box::pin(inner),
        }
    }
}

impl<T, E> Chunks<T, E> {
    /// The abort policy this sequence was created with.
    #[inline]
    pub fn policy(&self) -> AbortPolicy {
        self.policy
    }
}

impl<T, E> Stream for Chunks<T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T, E> fmt::Debug for Chunks<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunks")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
