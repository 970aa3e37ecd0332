//! Tests for configuration validation

use std::time::Duration;

use prometheus_scheduler::config::{PoolConfig, SchedulerConfig};

#[test]
fn test_pool_config_validation() {
    let valid = PoolConfig {
        capacity: 4,
        admission_timeout_ms: Some(1_000),
    };
    assert!(valid.validate().is_ok());
    assert_eq!(valid.admission_timeout(), Some(Duration::from_secs(1)));
}

#[test]
fn test_pool_config_invalid_capacity() {
    let invalid = PoolConfig {
        capacity: 0,
        admission_timeout_ms: None,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_timeout() {
    let invalid = PoolConfig {
        capacity: 2,
        admission_timeout_ms: Some(0),
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_validation() {
    let mut pools = std::collections::HashMap::new();
    pools.insert("inference".to_string(), PoolConfig::with_capacity(2));

    let config = SchedulerConfig { pools };
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_empty_pools() {
    let config = SchedulerConfig {
        pools: std::collections::HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_scheduler_config_reports_bad_pool_name() {
    let mut pools = std::collections::HashMap::new();
    pools.insert("embeddings".to_string(), PoolConfig::with_capacity(0));

    let err = SchedulerConfig { pools }.validate().unwrap_err();
    assert!(err.contains("embeddings"));
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "pools": {
            "inference": { "capacity": 2 },
            "downloads": { "capacity": 8, "admission_timeout_ms": 5000 }
        }
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.pools["inference"].admission_timeout_ms, None);
    assert_eq!(config.pools["downloads"].capacity, 8);
}

#[test]
fn test_scheduler_config_from_json_negative_capacity() {
    let json = r#"{ "pools": { "inference": { "capacity": -1 } } }"#;
    let err = SchedulerConfig::from_json_str(json).unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_scheduler_config_from_json_zero_capacity() {
    let json = r#"{ "pools": { "inference": { "capacity": 0 } } }"#;
    assert!(SchedulerConfig::from_json_str(json).is_err());
}
