//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use prometheus_scheduler::builders::{build_schedulers, SchedulerBuilder};
use prometheus_scheduler::config::{PoolConfig, SchedulerConfig};
use prometheus_scheduler::core::{AuditAction, SchedulerError, SharedAuditSink};

#[test]
fn test_scheduler_builder_defaults() {
    let builder = SchedulerBuilder::new(3);
    assert_eq!(builder.config().capacity, 3);
    assert_eq!(builder.config().admission_timeout_ms, None);

    let scheduler = builder.build().unwrap();
    assert_eq!(scheduler.capacity(), 3);
    assert_eq!(scheduler.admission_timeout(), None);
}

#[test]
fn test_scheduler_builder_timeout() {
    let scheduler = SchedulerBuilder::new(1)
        .admission_timeout(Duration::from_millis(750))
        .build()
        .unwrap();
    assert_eq!(scheduler.admission_timeout(), Some(Duration::from_millis(750)));
}

#[test]
fn test_scheduler_builder_rejects_zero_capacity() {
    let err = SchedulerBuilder::new(0).build().unwrap_err();
    assert!(matches!(err, SchedulerError::Configuration(_)));
}

#[tokio::test]
async fn test_scheduler_builder_audit() {
    let sink = SharedAuditSink::new(16);
    let scheduler = SchedulerBuilder::new(1)
        .audit(Box::new(sink.clone()))
        .build()
        .unwrap();

    scheduler
        .submit(|| async { Ok::<_, anyhow::Error>(()) })
        .await
        .unwrap();

    let actions: Vec<AuditAction> = sink.events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Admitted, AuditAction::Completed, AuditAction::Released]
    );
}

#[test]
fn test_build_schedulers_from_config() {
    let mut pools = HashMap::new();
    pools.insert("inference".to_string(), PoolConfig::with_capacity(2));
    pools.insert(
        "downloads".to_string(),
        PoolConfig {
            capacity: 8,
            admission_timeout_ms: Some(100),
        },
    );

    let schedulers = build_schedulers(&SchedulerConfig { pools }).unwrap();
    assert_eq!(schedulers.len(), 2);
    assert_eq!(schedulers["inference"].capacity(), 2);
    assert_eq!(
        schedulers["downloads"].admission_timeout(),
        Some(Duration::from_millis(100))
    );
    assert_ne!(schedulers["inference"].id(), schedulers["downloads"].id());
}

#[test]
fn test_build_schedulers_invalid_config() {
    let config = SchedulerConfig {
        pools: HashMap::new(),
    };
    assert!(matches!(
        build_schedulers(&config),
        Err(SchedulerError::Configuration(_))
    ));
}
