//! One-shot and repeating timers with cancellation.
//!
//! A repeating timer is a loop on a spawned future: each iteration sleeps for
//! the period after the previous callback returned, then runs the callback.
//! Cancelling flips a flag and wakes the sleeping iteration, so at most the
//! callback currently executing finishes and nothing is scheduled after it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use super::Spawn;

struct TimerState {
    cancelled: AtomicBool,
    wake: Notify,
    fired: AtomicU64,
}

impl TimerState {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
            fired: AtomicU64::new(0),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `delay`; `false` if cancelled first.
    async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(delay) => !self.is_cancelled(),
            () = self.wake.notified() => false,
        }
    }
}

/// Handle to a scheduled timer. Clones control the same timer.
#[derive(Clone)]
pub struct TimerHandle {
    state: Arc<TimerState>,
}

impl TimerHandle {
    /// Prevent any not-yet-fired callback from firing.
    ///
    /// Returns `true` if this call cancelled the timer, `false` if it was
    /// already cancelled.
    pub fn cancel(&self) -> bool {
        if self.state.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        // notify_one stores a permit if the timer is between sleeps.
        self.state.wake.notify_one();
        true
    }

    /// Whether [`TimerHandle::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Number of times the callback has run.
    pub fn fired(&self) -> u64 {
        self.state.fired.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .field("fired", &self.fired())
            .finish()
    }
}

/// Timer service running callbacks on a [`Spawn`] implementation.
#[derive(Clone)]
pub struct Timer<S> {
    spawner: S,
}

impl<S: Spawn> Timer<S> {
    /// Create a timer service on `spawner`.
    pub const fn new(spawner: S) -> Self {
        Self { spawner }
    }

    /// Run `callback` once, no earlier than `delay` from now.
    pub fn after<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(TimerState::new());
        let task_state = Arc::clone(&state);
        self.spawner.spawn(async move {
            if task_state.sleep(delay).await {
                callback();
                task_state.fired.fetch_add(1, Ordering::AcqRel);
            } else {
                tracing::trace!(?delay, "one-shot timer cancelled");
            }
        });
        TimerHandle { state }
    }

    /// Run `callback` every `period` until cancelled. The first run happens one
    /// period from now; each later run one period after the previous returned.
    pub fn every<F>(&self, period: Duration, mut callback: F) -> TimerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let state = Arc::new(TimerState::new());
        let task_state = Arc::clone(&state);
        self.spawner.spawn(async move {
            while task_state.sleep(period).await {
                callback();
                task_state.fired.fetch_add(1, Ordering::AcqRel);
            }
            tracing::trace!(
                ?period,
                fired = task_state.fired.load(Ordering::Acquire),
                "repeating timer stopped"
            );
        });
        TimerHandle { state }
    }
}
