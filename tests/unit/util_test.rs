//! Tests for utility functions

use prometheus_scheduler::util::{init_tracing, init_tracing_with, now_ms};

#[test]
fn test_now_ms_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing_with("prometheus_scheduler=debug");
    tracing::debug!("tracing initialised twice without panicking");
}
