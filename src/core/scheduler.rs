//! Bounded-concurrency scheduler with FIFO admission.
//!
//! A [`Scheduler`] admits at most `capacity` tasks at once. A submission that
//! arrives while a slot is free starts immediately; otherwise it parks at the
//! tail of the waiting line and sleeps until a release hands it a slot.
//!
//! Admission and release share one critical section over the running count
//! and the waiting line. A release never decrements the running count while
//! somebody is waiting: the freed slot is transferred to the head waiter
//! directly, so no later arrival can observe it and jump the line.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::PoolConfig;
use crate::runtime::Spawn;

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::waiting_line::{AdmissionToken, WaitingLine};
use super::{SchedulerError, Task};

/// Arrival sequence number of one submission, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(u64);

impl SubmissionId {
    /// Wrap a raw sequence number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Point-in-time view of a scheduler's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Scheduler instance identifier.
    pub id: Uuid,
    /// Concurrency cap.
    pub capacity: usize,
    /// Tasks currently holding a slot.
    pub running: usize,
    /// Submissions parked in the waiting line.
    pub waiting: usize,
    /// Whether an invariant violation has disabled the scheduler.
    pub poisoned: bool,
}

struct State {
    running: usize,
    line: WaitingLine,
    next_submission: u64,
    poisoned: Option<String>,
}

struct Shared {
    id: Uuid,
    capacity: usize,
    state: Mutex<State>,
    /// Locked only while `state` is held, never the other way round.
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

impl Shared {
    fn record(&self, state: &State, submission: SubmissionId, action: AuditAction) {
        let mut audit = self.audit.lock();
        if let Some(sink) = audit.as_mut() {
            sink.record(build_audit_event(
                self.id,
                submission,
                action,
                state.running,
                state.line.len(),
            ));
        }
    }

    fn ensure_healthy(state: &State) -> Result<(), SchedulerError> {
        match &state.poisoned {
            Some(reason) => Err(SchedulerError::InvariantViolation(reason.clone())),
            None => Ok(()),
        }
    }

    /// Mark the scheduler unusable and close every parked submission.
    fn poison(&self, state: &mut State, reason: String) -> SchedulerError {
        let closed = state.line.drain();
        tracing::error!(
            scheduler = %self.id,
            running = state.running,
            closed,
            %reason,
            "scheduler invariant violated, refusing further submissions"
        );
        state.poisoned = Some(reason.clone());
        SchedulerError::InvariantViolation(reason)
    }

    fn release(&self, submission: SubmissionId) {
        let mut state = self.state.lock();
        self.release_locked(&mut state, submission);
    }

    /// Return one slot: hand it to the head waiter if there is one, otherwise
    /// decrement the running count.
    fn release_locked(&self, state: &mut State, submission: SubmissionId) {
        if state.poisoned.is_some() {
            return;
        }
        while let Some(waiter) = state.line.pop_front() {
            let (token, next) = (waiter.token, waiter.submission);
            if waiter.wake() {
                tracing::debug!(
                    scheduler = %self.id,
                    %submission,
                    woken = %next,
                    %token,
                    running = state.running,
                    waiting = state.line.len(),
                    "slot handed to head of waiting line"
                );
                self.record(state, next, AuditAction::Woken);
                return;
            }
            tracing::warn!(scheduler = %self.id, %token, "parked submission vanished before wake");
        }
        if let Some(running) = state.running.checked_sub(1) {
            state.running = running;
            tracing::debug!(scheduler = %self.id, %submission, running, "slot released");
            self.record(state, submission, AuditAction::Released);
        } else {
            let _ = self.poison(state, format!("running count underflow releasing {submission}"));
        }
    }
}

/// Proof that one slot is held. Dropping it releases the slot and wakes the
/// next waiter, whether the holder finished, failed, panicked or was cancelled.
pub struct Permit {
    shared: Arc<Shared>,
    submission: SubmissionId,
}

impl Permit {
    /// Submission this slot was granted to.
    pub const fn submission(&self) -> SubmissionId {
        self.submission
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("scheduler", &self.shared.id)
            .field("submission", &self.submission)
            .finish()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.shared.release(self.submission);
    }
}

/// A parked submission waiting for its token to be woken.
struct Ticket {
    shared: Arc<Shared>,
    submission: SubmissionId,
    token: AdmissionToken,
    /// Kept inside the ticket so it outlives the removal done in `Drop`.
    rx: oneshot::Receiver<()>,
    settled: bool,
}

impl Ticket {
    async fn wait(mut self, timeout: Option<Duration>) -> Result<Permit, SchedulerError> {
        let woken = match timeout {
            None => (&mut self.rx).await,
            Some(limit) => match tokio::time::timeout(limit, &mut self.rx).await {
                Ok(woken) => woken,
                Err(_) => return self.expire(limit),
            },
        };
        self.settled = true;
        match woken {
            Ok(()) => Ok(self.claim()),
            Err(_) => Err(self.closed()),
        }
    }

    fn claim(&self) -> Permit {
        Permit {
            shared: Arc::clone(&self.shared),
            submission: self.submission,
        }
    }

    fn closed(&self) -> SchedulerError {
        let state = self.shared.state.lock();
        SchedulerError::InvariantViolation(
            state
                .poisoned
                .clone()
                .unwrap_or_else(|| "waiting line closed".into()),
        )
    }

    /// Give up after the admission timeout. A wake that raced the deadline
    /// wins: the slot is already ours, so it is kept rather than bounced.
    fn expire(&mut self, limit: Duration) -> Result<Permit, SchedulerError> {
        self.settled = true;
        let mut state = self.shared.state.lock();
        Shared::ensure_healthy(&state)?;
        if state.line.remove(self.token) {
            tracing::warn!(
                scheduler = %self.shared.id,
                submission = %self.submission,
                ?limit,
                "admission timed out"
            );
            self.shared.record(&state, self.submission, AuditAction::TimedOut);
            return Err(SchedulerError::AdmissionTimeout(limit));
        }
        drop(state);
        Ok(self.claim())
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.shared.state.lock();
        if state.poisoned.is_some() {
            return;
        }
        if state.line.remove(self.token) {
            tracing::warn!(
                scheduler = %self.shared.id,
                submission = %self.submission,
                "parked submission dropped before admission"
            );
            self.shared.record(&state, self.submission, AuditAction::Abandoned);
            return;
        }
        // Woken but never claimed: the slot was already transferred to us.
        self.shared.release_locked(&mut state, self.submission);
    }
}

/// Result of arriving at the scheduler: a slot right away, or a place in line.
enum Entry {
    Admitted(Permit),
    Parked(Ticket),
}

impl Entry {
    async fn admit(self, timeout: Option<Duration>) -> Result<Permit, SchedulerError> {
        match self {
            Self::Admitted(permit) => Ok(permit),
            Self::Parked(ticket) => ticket.wait(timeout).await,
        }
    }
}

async fn run_admitted<T: Task>(permit: Permit, task: T) -> Result<T::Output, SchedulerError> {
    let submission = permit.submission;
    tracing::debug!(scheduler = %permit.shared.id, %submission, "task started");
    let outcome = task.run().await;
    {
        let state = permit.shared.state.lock();
        let action = if outcome.is_ok() {
            AuditAction::Completed
        } else {
            AuditAction::Failed
        };
        permit.shared.record(&state, submission, action);
    }
    drop(permit);
    outcome.map_err(|err| {
        tracing::debug!(%submission, error = %err, "task failed");
        SchedulerError::TaskFailed(err)
    })
}

/// Concurrency-limiting scheduler.
///
/// Cloning is cheap; every clone shares the same slots and waiting line.
///
/// ```rust,ignore
/// use prometheus_scheduler::core::Scheduler;
///
/// let scheduler = Scheduler::new(2)?;
/// let value = scheduler.submit(|| async { Ok::<_, std::io::Error>(42) }).await?;
/// assert_eq!(value, 42);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
    admission_timeout: Option<Duration>,
}

impl Scheduler {
    /// Create a scheduler allowing `capacity` tasks in flight.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Configuration` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, SchedulerError> {
        if capacity == 0 {
            return Err(SchedulerError::Configuration(
                "capacity must be greater than 0".into(),
            ));
        }
        let id = Uuid::new_v4();
        tracing::info!(scheduler = %id, capacity, "scheduler created");
        Ok(Self {
            shared: Arc::new(Shared {
                id,
                capacity,
                state: Mutex::new(State {
                    running: 0,
                    line: WaitingLine::new(),
                    next_submission: 0,
                    poisoned: None,
                }),
                audit: Mutex::new(None),
            }),
            admission_timeout: None,
        })
    }

    /// Create a scheduler from validated pool configuration.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Configuration` if the configuration is invalid.
    pub fn from_config(cfg: &PoolConfig) -> Result<Self, SchedulerError> {
        cfg.validate().map_err(SchedulerError::Configuration)?;
        let scheduler = Self::new(cfg.capacity)?;
        Ok(match cfg.admission_timeout() {
            Some(timeout) => scheduler.with_admission_timeout(timeout),
            None => scheduler,
        })
    }

    /// Give up on admission after `timeout` with `SchedulerError::AdmissionTimeout`.
    /// Applies to submissions made through this handle.
    #[must_use]
    pub const fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.admission_timeout = Some(timeout);
        self
    }

    /// Attach an audit sink. Replaces any previous sink on every clone.
    #[must_use]
    pub fn with_audit(self, sink: Box<dyn AuditSink>) -> Self {
        *self.shared.audit.lock() = Some(sink);
        self
    }

    /// Run `task` under the concurrency cap and return its outcome.
    ///
    /// Starts immediately if a slot is free, otherwise waits in FIFO order.
    /// The slot is released before the outcome is returned, whatever it is.
    ///
    /// # Errors
    ///
    /// `TaskFailed` with the task's own error, `AdmissionTimeout` if a timeout
    /// is configured and expires while parked, `InvariantViolation` if the
    /// scheduler is poisoned.
    pub async fn submit<T: Task>(&self, task: T) -> Result<T::Output, SchedulerError> {
        let entry = self.enter()?;
        let permit = entry.admit(self.admission_timeout).await?;
        run_admitted(permit, task).await
    }

    /// Wait for a slot without running anything; the slot is held until the
    /// returned permit is dropped.
    ///
    /// # Errors
    ///
    /// Same admission errors as [`Scheduler::submit`].
    pub async fn acquire(&self) -> Result<Permit, SchedulerError> {
        self.enter()?.admit(self.admission_timeout).await
    }

    /// Take a place in line now, then wait, run and release on `spawner`.
    ///
    /// Arrival order is fixed when this is called, not when the spawned
    /// future is first polled.
    pub fn spawn_on<S, T>(&self, spawner: &S, task: T) -> SubmissionHandle<T::Output>
    where
        S: Spawn,
        T: Task + 'static,
        T::Output: 'static,
    {
        let (tx, rx) = oneshot::channel();
        match self.enter() {
            Ok(entry) => {
                let timeout = self.admission_timeout;
                spawner.spawn(async move {
                    let outcome = match entry.admit(timeout).await {
                        Ok(permit) => run_admitted(permit, task).await,
                        Err(err) => Err(err),
                    };
                    let _ = tx.send(outcome);
                });
            }
            Err(err) => {
                let _ = tx.send(Err(err));
            }
        }
        SubmissionHandle { rx }
    }

    /// Arrive: take a slot if one is free, otherwise join the waiting line.
    fn enter(&self) -> Result<Entry, SchedulerError> {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        Shared::ensure_healthy(&state)?;

        let submission = SubmissionId::new(state.next_submission);
        state.next_submission += 1;

        if state.running < shared.capacity {
            if !state.line.is_empty() {
                let reason = format!(
                    "{} submissions waiting while {} of {} slots are used",
                    state.line.len(),
                    state.running,
                    shared.capacity
                );
                return Err(shared.poison(&mut state, reason));
            }
            state.running += 1;
            tracing::debug!(scheduler = %shared.id, %submission, running = state.running, "admitted");
            shared.record(&state, submission, AuditAction::Admitted);
            return Ok(Entry::Admitted(Permit {
                shared: Arc::clone(shared),
                submission,
            }));
        }

        if state.running > shared.capacity {
            let reason = format!(
                "running count {} exceeds capacity {}",
                state.running, shared.capacity
            );
            return Err(shared.poison(&mut state, reason));
        }

        let (token, rx) = state.line.push_back(submission);
        tracing::debug!(
            scheduler = %shared.id,
            %submission,
            %token,
            waiting = state.line.len(),
            "capacity full, parked"
        );
        shared.record(&state, submission, AuditAction::Queued);
        Ok(Entry::Parked(Ticket {
            shared: Arc::clone(shared),
            submission,
            token,
            rx,
            settled: false,
        }))
    }

    /// Scheduler instance identifier.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Concurrency cap.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Admission timeout applied by this handle.
    pub const fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout
    }

    /// Tasks currently holding a slot.
    pub fn running(&self) -> usize {
        self.shared.state.lock().running
    }

    /// Submissions parked in the waiting line.
    pub fn waiting(&self) -> usize {
        self.shared.state.lock().line.len()
    }

    /// Whether an invariant violation has disabled this scheduler.
    pub fn is_poisoned(&self) -> bool {
        self.shared.state.lock().poisoned.is_some()
    }

    /// Consistent view of capacity, running count and waiting line length.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.shared.state.lock();
        SchedulerSnapshot {
            id: self.shared.id,
            capacity: self.shared.capacity,
            running: state.running,
            waiting: state.line.len(),
            poisoned: state.poisoned.is_some(),
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Scheduler")
            .field("id", &snapshot.id)
            .field("capacity", &snapshot.capacity)
            .field("running", &snapshot.running)
            .field("waiting", &snapshot.waiting)
            .field("poisoned", &snapshot.poisoned)
            .field("admission_timeout", &self.admission_timeout)
            .finish()
    }
}

/// Outcome of a submission started with [`Scheduler::spawn_on`].
pub struct SubmissionHandle<T> {
    rx: oneshot::Receiver<Result<T, SchedulerError>>,
}

impl<T> SubmissionHandle<T> {
    /// Wait for the submission's outcome.
    ///
    /// # Errors
    ///
    /// The submission's own error, or `SubmissionLost` if the spawned future
    /// was dropped (runtime shutdown, task panic) before reporting.
    pub async fn join(self) -> Result<T, SchedulerError> {
        self.rx
            .await
            .unwrap_or_else(|_| Err(SchedulerError::SubmissionLost))
    }
}

impl<T> fmt::Debug for SubmissionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionHandle").finish_non_exhaustive()
    }
}
