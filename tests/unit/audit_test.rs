//! Tests for audit sink

use prometheus_scheduler::core::{
    build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, Scheduler, SubmissionId,
};
use uuid::Uuid;

fn event(scheduler: Uuid, action: AuditAction) -> prometheus_scheduler::core::AuditEvent {
    build_audit_event(scheduler, first_submission(), action, 1, 0)
}

fn first_submission() -> SubmissionId {
    SubmissionId::new(0)
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let id = Uuid::new_v4();

    sink.record(event(id, AuditAction::Admitted));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].scheduler, id);
    assert_eq!(events[0].submission.get(), 0);
    assert_eq!(events[0].action, AuditAction::Admitted);
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    let id = Uuid::new_v4();

    sink.record(event(id, AuditAction::Queued));
    sink.record(event(id, AuditAction::Woken));
    sink.record(event(id, AuditAction::Completed));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, AuditAction::Woken); // First one popped
    assert_eq!(events[1].action, AuditAction::Completed);
}

#[test]
fn test_audit_action_serialization() {
    assert_eq!(AuditAction::TimedOut.to_string(), "timed_out");
    assert_eq!(
        serde_json::to_string(&AuditAction::TimedOut).unwrap(),
        "\"timed_out\""
    );
}

#[tokio::test]
async fn test_audit_trail_for_queued_submission() {
    let sink = prometheus_scheduler::core::SharedAuditSink::new(32);
    let scheduler = Scheduler::new(1).unwrap().with_audit(Box::new(sink.clone()));

    let held = scheduler.acquire().await.unwrap();
    let waiter = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            scheduler
                .submit(|| async { Ok::<_, anyhow::Error>(String::from("ran")) })
                .await
        })
    };
    while scheduler.waiting() == 0 {
        tokio::task::yield_now().await;
    }
    drop(held);
    assert_eq!(waiter.await.unwrap().unwrap(), "ran");

    let trail: Vec<(u64, AuditAction)> = sink
        .events()
        .iter()
        .map(|e| (e.submission.get(), e.action))
        .collect();
    assert_eq!(
        trail,
        vec![
            (0, AuditAction::Admitted),
            (1, AuditAction::Queued),
            (1, AuditAction::Woken),
            (1, AuditAction::Completed),
            (1, AuditAction::Released),
        ]
    );
}
