//! Runtime adapters: spawning, timers and the read-only API surface.

pub mod api;
pub mod timer;
pub mod tokio_spawner;

use std::future::Future;

pub use api::{health, list_pools, Health, PoolSnapshot};
pub use timer::{Timer, TimerHandle};
pub use tokio_spawner::TokioSpawner;

/// Abstraction for spawning background futures on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
