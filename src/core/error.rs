//! Error types for scheduler operations.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler configuration is invalid (e.g. zero capacity).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The submitted task itself failed; the source is the task's own error.
    #[error("task failed: {0}")]
    TaskFailed(#[source] anyhow::Error),
    /// Submission waited longer than the configured admission timeout.
    #[error("admission timed out after {0:?}")]
    AdmissionTimeout(Duration),
    /// Internal bookkeeping is corrupt; the scheduler is no longer usable.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// A background submission was dropped before it produced an outcome.
    #[error("submission dropped before producing an outcome")]
    SubmissionLost,
}

impl SchedulerError {
    /// Returns the task's own error if this is a task failure.
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::TaskFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for task bodies and higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
