//! Core scheduling abstractions and capacity accounting.

pub mod audit;
pub mod error;
pub mod scheduler;
pub mod task;
pub mod waiting_line;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, SharedAuditSink,
};
pub use error::{AppResult, SchedulerError};
pub use scheduler::{Permit, Scheduler, SchedulerSnapshot, SubmissionHandle, SubmissionId};
pub use task::Task;
pub use waiting_line::AdmissionToken;
