//! # Chunks and the append-only chain that links them.
//!
//! A stream's history is a [`Chain`] of [`Chunk`]s. The chain always starts with
//! [`Chunk::Start`] and grows only at the tail; it is never pruned.
//!
//! ## "Next" resolution
//! ```text
//! index:   0        1         2         3
//!        Start ─► Data(a) ─► Data(b) ─► Close ─┐
//!                                        ▲     │  terminal chunks resolve
//!                                        └─────┘  their next to themselves
//! ```
//! - The next of chunk `i` is resolved exactly once: when chunk `i + 1` is appended.
//! - `Close` and `Error` are resolved at creation (to themselves), so a cursor that
//!   reaches a terminal chunk never waits again.
//! - Nothing is appended after a terminal chunk, which is what keeps every
//!   resolution single-assignment.

use std::ops::Index;

/// One immutable unit of a broadcast stream's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk<T, E> {
    /// Marker at the head of every chain; never yielded.
    Start,
    /// A payload emitted by the producer.
    Data(T),
    /// Normal termination marker.
    Close,
    /// Abnormal termination marker carrying the abort reason.
    Error(E),
}

impl<T, E> Chunk<T, E> {
    /// True for [`Chunk::Close`] and [`Chunk::Error`].
    #[inline]
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, Chunk::Close | Chunk::Error(_))
    }
}

/// Lifecycle of a broadcast stream.
///
/// `Open` moves to exactly one of the two terminal states, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Accepting chunks.
    Open,
    /// A close marker was appended.
    Closed,
    /// An error marker was appended.
    Aborted,
}

impl StreamState {
    /// True for `Closed` and `Aborted`.
    #[inline]
    pub fn has_ended(&self) -> bool {
        !matches!(self, StreamState::Open)
    }
}

/// Append-only chunk log. Positions are plain indices.
#[derive(Debug)]
pub(crate) struct Chain<T, E> {
    chunks: Vec<Chunk<T, E>>,
}

impl<T, E> Chain<T, E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut chunks = Vec::with_capacity(capacity.max(1));
        chunks.push(Chunk::Start);
        Self { chunks }
    }

    /// Number of chunks, start marker included.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Position of the most recent chunk.
    #[inline]
    pub(crate) fn tail(&self) -> usize {
        self.chunks.len() - 1
    }

    /// State derived from the tail chunk.
    pub(crate) fn state(&self) -> StreamState {
        match self.chunks.last() {
            Some(Chunk::Close) => StreamState::Closed,
            Some(Chunk::Error(_)) => StreamState::Aborted,
            _ => StreamState::Open,
        }
    }

    /// The abort reason, if the chain ends with an error marker.
    pub(crate) fn abort_reason(&self) -> Option<&E> {
        match self.chunks.last() {
            Some(Chunk::Error(e)) => Some(e),
            _ => None,
        }
    }

    /// Resolved next position of `pos`, or `None` while it is still pending.
    pub(crate) fn next_of(&self, pos: usize) -> Option<usize> {
        if self.chunks[pos].is_terminal() {
            Some(pos)
        } else if pos + 1 < self.chunks.len() {
            Some(pos + 1)
        } else {
            None
        }
    }

    /// Appends `chunk` at the tail if the chain is still open.
    ///
    /// Returns the new chain length, or `None` if the chain already ended.
    pub(crate) fn append(&mut self, chunk: Chunk<T, E>) -> Option<usize> {
        if self.state().has_ended() {
            return None;
        }
        self.chunks.push(chunk);
        Some(self.chunks.len())
    }
}

impl<T, E> Index<usize> for Chain<T, E> {
    type Output = Chunk<T, E>;

    fn index(&self, pos: usize) -> &Self::Output {
        &self.chunks[pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_is_open_with_pending_start() {
        let chain: Chain<u8, ()> = Chain::with_capacity(0);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0], Chunk::Start);
        assert_eq!(chain.state(), StreamState::Open);
        assert_eq!(chain.next_of(0), None);
    }

    #[test]
    fn test_append_resolves_previous_tail() {
        let mut chain: Chain<u8, ()> = Chain::with_capacity(4);
        assert_eq!(chain.append(Chunk::Data(1)), Some(2));
        assert_eq!(chain.next_of(0), Some(1));
        assert_eq!(chain.next_of(1), None);
        assert_eq!(chain[1], Chunk::Data(1));
    }

    #[test]
    fn test_terminal_chunks_resolve_to_themselves() {
        let mut chain: Chain<u8, &str> = Chain::with_capacity(4);
        chain.append(Chunk::Data(1));
        chain.append(Chunk::Error("boom"));
        let tail = chain.tail();
        assert_eq!(chain.next_of(tail), Some(tail));
        assert_eq!(chain.state(), StreamState::Aborted);
        assert_eq!(chain.abort_reason(), Some(&"boom"));
    }

    #[test]
    fn test_append_after_terminal_is_refused() {
        let mut chain: Chain<u8, &str> = Chain::with_capacity(4);
        chain.append(Chunk::Close);
        assert_eq!(chain.append(Chunk::Data(9)), None);
        assert_eq!(chain.append(Chunk::Error("late")), None);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.state(), StreamState::Closed);
        assert_eq!(chain.abort_reason(), None);
    }
}
