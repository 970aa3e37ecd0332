//! Tests for error types

use std::time::Duration;

use prometheus_scheduler::core::SchedulerError;

#[test]
fn test_configuration_error() {
    let err = SchedulerError::Configuration("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_task_failed_error_keeps_source() {
    let err = SchedulerError::TaskFailed(anyhow::anyhow!("upstream 503"));
    assert_eq!(format!("{}", err), "task failed: upstream 503");
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(err.task_error().unwrap().to_string(), "upstream 503");
}

#[test]
fn test_admission_timeout_error() {
    let err = SchedulerError::AdmissionTimeout(Duration::from_millis(250));
    assert_eq!(format!("{}", err), "admission timed out after 250ms");
    assert!(err.task_error().is_none());
}

#[test]
fn test_invariant_violation_error() {
    let err = SchedulerError::InvariantViolation("running count 3 exceeds capacity 2".to_string());
    assert_eq!(
        format!("{}", err),
        "invariant violation: running count 3 exceeds capacity 2"
    );
}

#[test]
fn test_submission_lost_error() {
    let err = SchedulerError::SubmissionLost;
    assert_eq!(
        format!("{}", err),
        "submission dropped before producing an outcome"
    );
}
