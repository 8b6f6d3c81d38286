//! # Allocation hints for channels and streams.
//!
//! Provides [`Config`] shared sizing settings for [`EventChannel`](crate::EventChannel)
//! and [`BroadcastStream`](crate::BroadcastStream).
//!
//! Config is used in two ways:
//! 1. **Channel creation**: `EventChannel::with_config(&config)`
//! 2. **Stream creation**: `BroadcastStream::with_config(&config)`
//!
//! Both values are only preallocation hints: neither the subscription list nor the
//! chunk chain is bounded, and nothing is ever dropped when a hint is exceeded.
//!
//! ## Sentinel values
//! - `chunk_capacity = 0` → no preallocation beyond the start marker
//! - `subscriber_capacity = 0` → no preallocation

/// Sizing hints for the multicast primitives.
///
/// ## Field semantics
/// - `chunk_capacity`: chunks preallocated in a stream's chain (start marker included)
/// - `subscriber_capacity`: node records preallocated in a channel's subscription list
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of chunks to reserve up front in a broadcast stream's chain.
    ///
    /// The chain is append-only and never pruned, so long-lived streams with
    /// many emits grow past this value regardless.
    pub chunk_capacity: usize,

    /// Number of subscriptions to reserve up front in an event channel.
    pub subscriber_capacity: usize,
}

impl Config {
    /// Returns the chunk reservation, clamped to hold at least the start marker.
    #[inline]
    pub fn chunk_capacity_clamped(&self) -> usize {
        self.chunk_capacity.max(1)
    }

    /// Returns the subscriber reservation as an `Option`.
    ///
    /// - `None` → no preallocation
    /// - `Some(n)` → reserve `n` node records
    #[inline]
    pub fn subscriber_reservation(&self) -> Option<usize> {
        if self.subscriber_capacity == 0 {
            None
        } else {
            Some(self.subscriber_capacity)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `chunk_capacity = 64`
    /// - `subscriber_capacity = 8`
    fn default() -> Self {
        Self {
            chunk_capacity: 64,
            subscriber_capacity: 8,
        }
    }
}
