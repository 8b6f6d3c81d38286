//! # Broadcast stream: one producer, any number of late-attaching consumers.
//!
//! [`BroadcastStream`] appends chunks to a shared [`Chain`] and wakes waiting cursors
//! through a [`tokio::sync::watch`] channel that carries the chain length.
//!
//! ## Architecture
//! ```text
//! Producer (owner):                     Consumers (any number):
//!   emit(v) ──┐                          iterate() ─► Chunks { pos = tail at call }
//!   close() ──┼─► lock ─► Chain::append    iterate() ─► Chunks { pos = tail at call }
//!   abort(e) ─┘      └──► tail_tx.send_replace(len) ───► wakes cursors waiting on len
//! ```
//!
//! ## Rules
//! - **Never suspends**: producer calls are synchronous and return immediately.
//! - **First terminal wins**: after `close` or `abort`, every producer call is a
//!   no-op returning `false` (logged at `debug`).
//! - **No history replay**: a consumer sees only chunks appended after it attached.
//! - **No pruning**: the chain grows for the life of the stream.
//! - **Drop closes**: dropping an open stream appends a close marker, so no consumer
//!   waits forever on an abandoned producer.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::chunk::{Chain, Chunk, StreamState};
use super::cursor::{AbortPolicy, Chunks};
use crate::config::Config;

/// State shared between the producer and every cursor.
pub(crate) struct Shared<T, E> {
    pub(crate) chain: Mutex<Chain<T, E>>,
    /// Chain length; updated under the chain lock so it never moves backwards.
    pub(crate) tail_tx: watch::Sender<usize>,
}

/// Multicast async stream with independent, late-attaching consumers.
///
/// ### Properties
/// - **Ordered**: every consumer observes chunks in append order.
/// - **Independent**: consumers attached at different times see different suffixes,
///   never a reordering; dropping one affects nobody else.
/// - **Owned**: not `Clone`; hand out [`Chunks`] via [`iterate`](Self::iterate) instead.
///
/// ## Example
/// ```rust
/// use futures::StreamExt;
/// use tidings::{AbortPolicy, BroadcastStream};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let stream = BroadcastStream::<&str, &str>::new();
/// let consumer = stream.iterate(AbortPolicy::InOrder);
///
/// stream.emit("a");
/// stream.abort("boom");
/// assert!(stream.has_ended() && stream.is_aborted());
///
/// let seen: Vec<_> = consumer.collect().await;
/// assert_eq!(seen, vec![Ok("a"), Err("boom")]);
/// # }
/// ```
pub struct BroadcastStream<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> BroadcastStream<T, E> {
    /// Creates an open stream with default [`Config`].
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates an open stream, preallocating `chunk_capacity` chain entries.
    pub fn with_config(cfg: &Config) -> Self {
        let chain = Chain::with_capacity(cfg.chunk_capacity_clamped());
        let (tail_tx, _rx) = watch::channel(chain.len());
        Self {
            shared: Arc::new(Shared {
                chain: Mutex::new(chain),
                tail_tx,
            }),
        }
    }

    /// Appends a data chunk.
    ///
    /// Returns `false` (and drops `value`) if the stream already ended.
    pub fn emit(&self, value: T) -> bool {
        self.append(Chunk::Data(value))
    }

    /// Terminates the stream normally.
    ///
    /// Consumers finish after yielding every data chunk appended before this call.
    /// Returns `false` if the stream already ended.
    pub fn close(&self) -> bool {
        self.append(Chunk::Close)
    }

    /// Terminates the stream with `reason`.
    ///
    /// Consumers receive `Err(reason)` according to their [`AbortPolicy`].
    /// Returns `false` (and drops `reason`) if the stream already ended.
    pub fn abort(&self, reason: E) -> bool {
        self.append(Chunk::Error(reason))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.shared.chain.lock().state()
    }

    /// True once `close` or `abort` has taken effect.
    pub fn has_ended(&self) -> bool {
        self.state().has_ended()
    }

    /// True once `abort` has taken effect.
    pub fn is_aborted(&self) -> bool {
        self.state() == StreamState::Aborted
    }

    /// Number of data chunks appended so far.
    pub fn emitted(&self) -> usize {
        let chain = self.shared.chain.lock();
        let markers = if chain.state().has_ended() { 2 } else { 1 };
        chain.len() - markers
    }

    /// Waits one cooperative scheduling tick.
    ///
    /// Lets consumers driven by other tasks on the same runtime observe chunks that
    /// were appended synchronously before this call. Only an ordering aid for call
    /// sites and tests; delivery does not depend on it.
    pub async fn flush(&self) {
        tokio::task::yield_now().await;
    }

    fn append(&self, chunk: Chunk<T, E>) -> bool {
        let terminal = chunk.is_terminal();
        let mut chain = self.shared.chain.lock();

        match chain.append(chunk) {
            Some(len) => {
                self.shared.tail_tx.send_replace(len);
                if terminal {
                    debug!(state = ?chain.state(), len, "stream terminated");
                } else {
                    trace!(len, "chunk appended");
                }
                true
            }
            None => {
                debug!(state = ?chain.state(), terminal, "stream already ended; call ignored");
                false
            }
        }
    }
}

impl<T, E> BroadcastStream<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates an independent lazy sequence starting at the current tail.
    ///
    /// The cursor is attached **now**: chunks appended after this call are observed,
    /// earlier ones are not. If the stream already ended, the sequence reports the
    /// termination immediately (`None` for close, one `Err(reason)` for abort).
    pub fn iterate(&self, policy: AbortPolicy) -> Chunks<T, E> {
        Chunks::attach(Arc::clone(&self.shared), policy)
    }

    /// Shorthand for [`iterate`](Self::iterate) with [`AbortPolicy::default`].
    pub fn subscribe(&self) -> Chunks<T, E> {
        self.iterate(AbortPolicy::default())
    }
}

impl<T, E> Default for BroadcastStream<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Drop for BroadcastStream<T, E> {
    fn drop(&mut self) {
        let mut chain = self.shared.chain.lock();
        if let Some(len) = chain.append(Chunk::Close) {
            self.shared.tail_tx.send_replace(len);
            debug!(len, "open stream dropped; closed");
        }
    }
}

impl<T, E> fmt::Debug for BroadcastStream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.shared.chain.lock();
        f.debug_struct("BroadcastStream")
            .field("state", &chain.state())
            .field("chunks", &chain.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;
    use parking_lot::Mutex;

    use super::*;

    type TestStream = BroadcastStream<String, String>;

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn oks(items: &[&str]) -> Vec<Result<String, String>> {
        items.iter().map(|v| Ok(s(v))).collect()
    }

    #[tokio::test]
    async fn test_sends_data_then_ends() {
        let stream = TestStream::new();
        let consumer = stream.subscribe();

        stream.emit(s("First"));
        stream.emit(s("Second"));
        stream.close();

        let seen: Vec<_> = consumer.collect().await;
        assert_eq!(seen, oks(&["First", "Second"]));
    }

    #[tokio::test]
    async fn test_consumer_waiting_before_emits_is_woken() {
        let stream = TestStream::new();
        let consumer = stream.subscribe();
        let task = tokio::spawn(consumer.collect::<Vec<_>>());

        for v in ["1", "2", "3"] {
            tokio::task::yield_now().await;
            stream.emit(s(v));
        }
        stream.close();

        assert_eq!(task.await.unwrap(), oks(&["1", "2", "3"]));
    }

    #[tokio::test]
    async fn test_only_streams_elements_after_attach() {
        let stream = TestStream::new();
        stream.emit(s("First"));
        stream.emit(s("Second"));
        let consumer = stream.subscribe();
        stream.emit(s("Third"));
        stream.emit(s("Fourth"));
        stream.close();

        let seen: Vec<_> = consumer.collect().await;
        assert_eq!(seen, oks(&["Third", "Fourth"]));
    }

    #[tokio::test]
    async fn test_parallel_offset_consumers() {
        let stream = TestStream::new();
        let a = stream.subscribe();
        stream.emit(s("1"));
        stream.emit(s("2"));
        let b = stream.subscribe();
        stream.emit(s("3"));
        stream.close();

        let (a, b) = tokio::join!(a.collect::<Vec<_>>(), b.collect::<Vec<_>>());
        assert_eq!(a, oks(&["1", "2", "3"]));
        assert_eq!(b, oks(&["3"]));
    }

    #[tokio::test]
    async fn test_parallel_consumers_see_same_sequence() {
        let stream = TestStream::new();
        let x = tokio::spawn(stream.subscribe().collect::<Vec<_>>());
        let o = tokio::spawn(stream.subscribe().collect::<Vec<_>>());

        for v in ["First", "Second", "Third", "Fourth"] {
            stream.emit(s(v));
            stream.flush().await;
        }
        stream.close();

        let expected = oks(&["First", "Second", "Third", "Fourth"]);
        assert_eq!(x.await.unwrap(), expected);
        assert_eq!(o.await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_in_order_abort_yields_buffered_data_first() {
        let stream = TestStream::new();
        let consumer = stream.iterate(AbortPolicy::InOrder);

        stream.emit(s("First"));
        stream.emit(s("Second"));
        stream.emit(s("Third"));
        stream.abort(s("Test error"));

        let seen: Vec<_> = consumer.collect().await;
        let mut expected = oks(&["First", "Second", "Third"]);
        expected.push(Err(s("Test error")));
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_immediate_abort_skips_buffered_data() {
        let stream = TestStream::new();
        let mut consumer = stream.iterate(AbortPolicy::Immediate);

        stream.emit(s("First"));
        assert_eq!(consumer.next().await, Some(Ok(s("First"))));

        stream.emit(s("Second"));
        stream.emit(s("Third"));
        stream.abort(s("boom"));

        assert_eq!(consumer.next().await, Some(Err(s("boom"))));
        assert_eq!(consumer.next().await, None);
    }

    #[tokio::test]
    async fn test_immediate_on_already_aborted_stream_raises_without_data() {
        let stream = TestStream::new();
        stream.emit(s("buffered"));
        stream.abort(s("gone"));

        let seen: Vec<_> = stream.iterate(AbortPolicy::Immediate).collect().await;
        assert_eq!(seen, vec![Err(s("gone"))]);
    }

    #[tokio::test]
    async fn test_iterate_on_closed_stream_ends_immediately() {
        let stream = TestStream::new();
        stream.emit(s("old"));
        stream.close();

        let seen: Vec<_> = stream.subscribe().collect().await;
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_waiting_immediate_consumer_wakes_on_abort() {
        let stream = TestStream::new();
        let task = tokio::spawn(stream.iterate(AbortPolicy::Immediate).collect::<Vec<_>>());
        stream.flush().await;
        stream.abort(s("stop"));

        assert_eq!(task.await.unwrap(), vec![Err(s("stop"))]);
    }

    #[tokio::test]
    async fn test_termination_is_idempotent() {
        let stream = TestStream::new();
        let consumer = stream.subscribe();
        stream.emit(s("a"));
        assert!(stream.close());

        assert!(!stream.emit(s("late")));
        assert!(!stream.close());
        assert!(!stream.abort(s("late")));
        assert!(stream.has_ended());
        assert!(!stream.is_aborted());
        assert_eq!(stream.state(), StreamState::Closed);
        assert_eq!(stream.emitted(), 1);

        let seen: Vec<_> = consumer.collect().await;
        assert_eq!(seen, oks(&["a"]));
    }

    #[tokio::test]
    async fn test_abort_wins_over_later_close() {
        let stream = TestStream::new();
        assert!(stream.abort(s("first")));
        assert!(!stream.close());
        assert!(!stream.abort(s("second")));
        assert!(stream.is_aborted());

        let seen: Vec<_> = stream.subscribe().collect().await;
        assert_eq!(seen, vec![Err(s("first"))]);
    }

    #[tokio::test]
    async fn test_sequence_is_fused_after_terminal() {
        let stream = TestStream::new();
        let mut consumer = stream.subscribe();
        stream.abort(s("x"));

        assert_eq!(consumer.next().await, Some(Err(s("x"))));
        assert_eq!(consumer.next().await, None);
        assert_eq!(consumer.next().await, None);
    }

    #[tokio::test]
    async fn test_dropping_consumer_does_not_affect_others() {
        let stream = TestStream::new();
        let dropped = stream.subscribe();
        let kept = stream.subscribe();
        stream.emit(s("1"));
        drop(dropped);
        stream.emit(s("2"));
        stream.close();

        let seen: Vec<_> = kept.collect().await;
        assert_eq!(seen, oks(&["1", "2"]));
    }

    #[tokio::test]
    async fn test_dropping_open_stream_closes_consumers() {
        let stream = TestStream::new();
        let consumer = stream.subscribe();
        stream.emit(s("last"));
        drop(stream);

        let seen = tokio::time::timeout(Duration::from_secs(1), consumer.collect::<Vec<_>>())
            .await
            .expect("consumer must end when the producer is dropped");
        assert_eq!(seen, oks(&["last"]));
    }

    #[tokio::test]
    async fn test_flush_delivers_to_attached_consumers_before_new_attach() {
        let stream = TestStream::new();
        let log: Arc<Mutex<Vec<String>>> = Arc::default();

        let spawn_capture = |prefix: &'static str, chunks: Chunks<String, String>| {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let mut chunks = chunks;
                while let Some(Ok(v)) = chunks.next().await {
                    log.lock().push(format!("{prefix}: {v}"));
                }
            })
        };

        let x = spawn_capture("X", stream.subscribe());
        stream.emit(s("First"));
        stream.emit(s("Second"));
        stream.flush().await;
        assert_eq!(*log.lock(), vec!["X: First", "X: Second"]);

        let o = spawn_capture("O", stream.subscribe());
        stream.emit(s("Third"));
        stream.close();
        x.await.unwrap();
        o.await.unwrap();

        let log = log.lock();
        assert_eq!(log.len(), 4);
        assert!(log.contains(&s("X: Third")));
        assert!(log.contains(&s("O: Third")));
    }
}
