//! FIFO waiting line of parked admissions.

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::oneshot;

use super::SubmissionId;

/// Handle naming one parked submission's place in the waiting line.
///
/// Tokens are allocated from a monotonically increasing counter and are never
/// reused, so a stale token can never match a newer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdmissionToken(u64);

impl AdmissionToken {
    /// Raw token value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AdmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

/// A parked submission: its token and the one-shot channel that wakes it.
pub(crate) struct Waiter {
    pub(crate) token: AdmissionToken,
    pub(crate) submission: SubmissionId,
    waker: oneshot::Sender<()>,
}

impl Waiter {
    /// Wake the parked submission, handing it one unit of capacity.
    ///
    /// Consumes the waiter so a token can be woken at most once. Returns
    /// `false` if the receiving side is already gone.
    pub(crate) fn wake(self) -> bool {
        self.waker.send(()).is_ok()
    }
}

/// Insertion-ordered line of waiters.
///
/// Not synchronized on its own; the scheduler mutates it only inside its
/// admission critical section.
pub(crate) struct WaitingLine {
    entries: VecDeque<Waiter>,
    next_token: u64,
}

impl WaitingLine {
    pub(crate) const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_token: 0,
        }
    }

    /// Park a new waiter at the tail and return its token with the receiving half.
    pub(crate) fn push_back(
        &mut self,
        submission: SubmissionId,
    ) -> (AdmissionToken, oneshot::Receiver<()>) {
        let token = AdmissionToken(self.next_token);
        self.next_token += 1;
        let (waker, rx) = oneshot::channel();
        self.entries.push_back(Waiter {
            token,
            submission,
            waker,
        });
        (token, rx)
    }

    /// Take the head waiter, if any.
    pub(crate) fn pop_front(&mut self) -> Option<Waiter> {
        self.entries.pop_front()
    }

    /// Remove a waiter that gave up. Returns `false` if the token is no longer
    /// parked, meaning it was already woken.
    pub(crate) fn remove(&mut self, token: AdmissionToken) -> bool {
        match self.entries.iter().position(|w| w.token == token) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every waiter without waking it. Their receivers observe a closed channel.
    pub(crate) fn drain(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
