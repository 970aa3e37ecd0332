//! Audit trail of admission transitions.
//!
//! Events are recorded inside the scheduler's admission critical section, so
//! the order a sink observes is the order transitions actually happened.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;

use super::SubmissionId;

/// Admission transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Admitted on arrival because a slot was free.
    Admitted,
    /// Parked at the tail of the waiting line.
    Queued,
    /// Woken from the waiting line and handed a released slot.
    Woken,
    /// Task finished successfully.
    Completed,
    /// Task returned a failure.
    Failed,
    /// Parked submission was dropped before being woken.
    Abandoned,
    /// Parked submission gave up after the admission timeout.
    TimedOut,
    /// A slot was returned with nobody waiting for it.
    Released,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admitted => "admitted",
            Self::Queued => "queued",
            Self::Woken => "woken",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
            Self::TimedOut => "timed_out",
            Self::Released => "released",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Scheduler instance that produced the event.
    pub scheduler: Uuid,
    /// Submission the event is about.
    pub submission: SubmissionId,
    /// Transition taken.
    pub action: AuditAction,
    /// Running count after the transition.
    pub running: usize,
    /// Waiting line length after the transition.
    pub waiting: usize,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that forwards every event to a shared in-memory buffer.
///
/// Lets a caller keep reading events after handing the sink to a scheduler.
#[derive(Clone)]
pub struct SharedAuditSink {
    inner: std::sync::Arc<parking_lot::Mutex<InMemoryAuditSink>>,
}

impl SharedAuditSink {
    /// Create a shared sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            inner: std::sync::Arc::new(parking_lot::Mutex::new(InMemoryAuditSink::new(max_events))),
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events()
    }

    /// Submissions that took `action`, in recording order.
    pub fn submissions_with(&self, action: AuditAction) -> Vec<SubmissionId> {
        self.inner
            .lock()
            .events
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.submission)
            .collect()
    }
}

impl AuditSink for SharedAuditSink {
    fn record(&mut self, event: AuditEvent) {
        self.inner.lock().record(event);
    }
}

/// Build an audit event stamped with the current time.
pub fn build_audit_event(
    scheduler: Uuid,
    submission: SubmissionId,
    action: AuditAction,
    running: usize,
    waiting: usize,
) -> AuditEvent {
    AuditEvent {
        scheduler,
        submission,
        action,
        running,
        waiting,
        created_at_ms: now_ms(),
    }
}
