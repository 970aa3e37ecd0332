//! Tests for tokio spawner utilities and the API surface

use std::collections::HashMap;

use prometheus_scheduler::core::Scheduler;
use prometheus_scheduler::runtime::{health, list_pools, Spawn, TokioSpawner};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_spawner_owned_runtime() {
    let spawner = TokioSpawner::with_worker_threads(2).unwrap();
    let scheduler = Scheduler::new(1).unwrap();

    let handle = scheduler.spawn_on(&spawner, || async { Ok::<_, anyhow::Error>(9) });
    let value = spawner.handle().block_on(handle.join()).unwrap();
    assert_eq!(value, 9);
}

#[test]
fn test_list_pools_sorted() {
    let mut pools = HashMap::new();
    pools.insert("zeta".to_string(), Scheduler::new(1).unwrap());
    pools.insert("alpha".to_string(), Scheduler::new(4).unwrap());

    let listing = list_pools(&pools);
    assert_eq!(listing[0].name, "alpha");
    assert_eq!(listing[0].scheduler.capacity, 4);
    assert_eq!(listing[1].name, "zeta");
    assert_eq!(listing[1].scheduler.running, 0);

    let json = serde_json::to_value(&listing[0]).unwrap();
    assert_eq!(json["name"], "alpha");
    assert_eq!(json["capacity"], 4);
}

#[test]
fn test_health_ok() {
    let mut pools = HashMap::new();
    pools.insert("inference".to_string(), Scheduler::new(2).unwrap());
    let health = health(&pools);
    assert!(health.ok);
    assert!(health.poisoned.is_empty());
}
