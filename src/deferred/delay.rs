//! # Delay: an adjustable one-shot timer.
//!
//! [`Delay`] settles a [`Deferred<(), DelayError>`](Deferred) when its deadline passes,
//! or rejects it when [`Delay::abort`] is called first.
//!
//! ## Timing model
//! ```text
//! created ─────────── duration ───────────► deadline
//!    │                                         │
//!    ├─ set_duration(d)  deadline = created + d
//!    ├─ set_deadline(at) deadline = at, duration = at - created
//!    └─ reset()          deadline = now + duration
//! ```
//!
//! ## Rules
//! - The timer is armed at construction: a driver task resolves the outcome at the
//!   deadline whether or not anybody awaits it.
//! - The driver and waiters pick up deadline changes while they wait.
//! - Adjustments and `abort` after settlement are ignored (they return `false`);
//!   a deadline that already passed counts as settled even if the driver has not
//!   run yet.
//! - Dropping the [`Delay`] freezes the deadline; the driver still fires, so clones
//!   of [`Delay::outcome`] complete.
//! - Uses [`tokio::time::Instant`], so paused test clocks apply.
//!
//! ## Driver
//! ```text
//! loop {
//!   deadline = *deadline_rx
//!   select! {
//!     outcome settled        ─► stop
//!     sleep_until(deadline)  ─► resolve(()), stop
//!     deadline changed       ─► loop
//!     handle dropped         ─► wait for the last deadline, resolve(())
//!   }
//! }
//! ```

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::trace;

use super::value::Deferred;
use crate::error::{DeferredError, DelayError};

/// Adjustable one-shot timer with an abortable outcome.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tidings::{Delay, DelayError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let delay = Delay::after(Duration::from_millis(5));
/// assert_eq!(delay.wait().await, Ok(()));
///
/// let aborted = Delay::after(Duration::from_secs(60));
/// aborted.abort();
/// assert!(matches!(aborted.wait().await, Err(DelayError::Aborted { .. })));
/// # }
/// ```
pub struct Delay {
    created: Instant,
    duration: Mutex<Duration>,
    deadline_tx: watch::Sender<Instant>,
    outcome: Deferred<(), DelayError>,
}

impl Delay {
    /// Starts a delay that ends `duration` from now.
    ///
    /// ### Panics
    /// Panics if called outside a tokio runtime: the timer is driven by a spawned task.
    pub fn after(duration: Duration) -> Self {
        let created = Instant::now();
        let (deadline_tx, deadline_rx) = watch::channel(created + duration);
        let outcome = Deferred::new();
        tokio::spawn(drive(deadline_rx, outcome.clone(), created));

        Self {
            created,
            duration: Mutex::new(duration),
            deadline_tx,
            outcome,
        }
    }

    /// Starts a delay that ends at `deadline` (immediately if it is in the past).
    ///
    /// ### Panics
    /// Panics if called outside a tokio runtime.
    pub fn until(deadline: Instant) -> Self {
        Self::after(deadline.saturating_duration_since(Instant::now()))
    }

    /// Configured duration.
    pub fn duration(&self) -> Duration {
        *self.duration.lock()
    }

    /// Current deadline.
    pub fn deadline(&self) -> Instant {
        *self.deadline_tx.borrow()
    }

    /// Time since creation.
    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    /// Time left until the deadline (zero once it passed).
    pub fn remaining(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// The settlement of this delay.
    pub fn outcome(&self) -> &Deferred<(), DelayError> {
        self.settle_if_due();
        &self.outcome
    }

    /// True if aborted before the deadline passed.
    pub fn is_aborted(&self) -> bool {
        self.outcome.is_rejected()
    }

    /// Moves the deadline to `created + duration`.
    pub fn set_duration(&self, duration: Duration) -> bool {
        self.adjust(duration, self.created + duration)
    }

    /// Moves the deadline to `deadline`; the duration becomes `deadline - created`.
    pub fn set_deadline(&self, deadline: Instant) -> bool {
        let duration = deadline.saturating_duration_since(self.created);
        self.adjust(duration, deadline)
    }

    /// Restarts the countdown: the deadline becomes `now + duration`.
    pub fn reset(&self) -> bool {
        let duration = self.duration();
        self.adjust(duration, Instant::now() + duration)
    }

    /// Rejects current and future waits with [`DelayError::Aborted`].
    ///
    /// Returns `false` if the delay already settled or its deadline has passed.
    pub fn abort(&self) -> bool {
        self.settle_if_due();
        let aborted = self.outcome.reject(DelayError::Aborted {
            elapsed: self.elapsed(),
        });
        if aborted {
            trace!(elapsed = ?self.elapsed(), "delay aborted");
        }
        aborted
    }

    /// Waits for the deadline.
    pub async fn wait(&self) -> Result<(), DelayError> {
        self.settle_if_due();
        self.outcome.wait().await.map_err(DeferredError::into_inner)
    }

    fn settle_if_due(&self) {
        if !self.outcome.is_settled() && Instant::now() >= self.deadline() {
            fire(&self.outcome, self.created);
        }
    }

    fn adjust(&self, duration: Duration, deadline: Instant) -> bool {
        self.settle_if_due();
        if self.outcome.is_settled() {
            return false;
        }
        *self.duration.lock() = duration;
        self.deadline_tx.send_replace(deadline);
        true
    }
}

fn fire(outcome: &Deferred<(), DelayError>, created: Instant) {
    if outcome.resolve(()) {
        trace!(elapsed = ?created.elapsed(), "delay elapsed");
    }
}

async fn drive(
    mut deadline_rx: watch::Receiver<Instant>,
    outcome: Deferred<(), DelayError>,
    created: Instant,
) {
    loop {
        let deadline = *deadline_rx.borrow_and_update();
        tokio::select! {
            _ = outcome.wait() => return,
            _ = time::sleep_until(deadline) => {
                fire(&outcome, created);
                return;
            }
            changed = deadline_rx.changed() => {
                if changed.is_err() {
                    // handle dropped: the last deadline is final
                    tokio::select! {
                        _ = outcome.wait() => {}
                        _ = time::sleep_until(deadline) => fire(&outcome, created),
                    }
                    return;
                }
            }
        }
    }
}

impl std::fmt::Debug for Delay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delay")
            .field("duration", &self.duration())
            .field("remaining", &self.remaining())
            .field("outcome", &self.outcome)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_completes_at_deadline() {
        let start = Instant::now();
        let delay = Delay::after(Duration::from_millis(100));

        assert_eq!(delay.wait().await, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(delay.outcome().is_resolved());
        assert_eq!(delay.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_rejects_pending_waiter() {
        let delay = Arc::new(Delay::after(Duration::from_secs(10)));
        let waiter = {
            let delay = Arc::clone(&delay);
            tokio::spawn(async move { delay.wait().await })
        };

        time::sleep(Duration::from_secs(1)).await;
        assert!(delay.abort());
        assert!(!delay.abort());

        let res = waiter.await.unwrap();
        assert_eq!(
            res,
            Err(DelayError::Aborted {
                elapsed: Duration::from_secs(1)
            })
        );
        assert!(delay.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_duration_moves_pending_deadline() {
        let start = Instant::now();
        let delay = Arc::new(Delay::after(Duration::from_millis(100)));
        let waiter = {
            let delay = Arc::clone(&delay);
            tokio::spawn(async move { delay.wait().await })
        };

        tokio::task::yield_now().await;
        assert!(delay.set_duration(Duration::from_millis(300)));
        assert_eq!(delay.deadline(), start + Duration::from_millis(300));

        waiter.await.unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_countdown() {
        let delay = Delay::after(Duration::from_millis(100));
        time::sleep(Duration::from_millis(60)).await;
        let reset_at = Instant::now();
        assert!(delay.reset());

        delay.wait().await.unwrap();
        assert!(reset_at.elapsed() >= Duration::from_millis(100));
        assert_eq!(delay.duration(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_settles_without_waiter() {
        let delay = Delay::after(Duration::from_millis(10));
        let outcome = delay.outcome().clone();

        time::sleep(Duration::from_millis(50)).await;
        assert!(outcome.is_resolved());
        assert!(!delay.abort());
        assert!(!delay.is_aborted());
        assert_eq!(delay.wait().await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_after_deadline_returns_false() {
        let delay = Delay::after(Duration::from_millis(10));
        time::advance(Duration::from_millis(20)).await;

        assert!(!delay.abort());
        assert!(delay.outcome().is_resolved());
        assert_eq!(delay.wait().await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cloned_outcome_completes_after_handle_dropped() {
        let delay = Delay::after(Duration::from_millis(100));
        let outcome = delay.outcome().clone();
        drop(delay);

        let res = time::timeout(Duration::from_secs(1), outcome.wait()).await;
        assert_eq!(res, Ok(Ok(())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_adjustments_after_settlement_are_ignored() {
        let delay = Delay::until(Instant::now());
        delay.wait().await.unwrap();

        assert!(!delay.set_duration(Duration::from_secs(5)));
        assert!(!delay.set_deadline(Instant::now() + Duration::from_secs(5)));
        assert!(!delay.abort());
        assert_eq!(delay.wait().await, Ok(()));
    }
}
