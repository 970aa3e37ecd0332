//! # Prometheus Scheduler
//!
//! Bounded-concurrency execution of asynchronous tasks for the Prometheus AI Platform.
//!
//! A [`Scheduler`](core::Scheduler) is configured with a maximum number of tasks that
//! may be in flight at once. Submissions that arrive while a slot is free start
//! immediately; the rest park in a FIFO waiting line and are woken one at a time as
//! running tasks finish.
//!
//! ## Guarantees
//!
//! - **Capacity**: never more than `capacity` tasks running.
//! - **FIFO admission**: parked submissions are admitted strictly in arrival order.
//!   A released slot is handed straight to the head waiter, so a later arrival can
//!   never claim it first.
//! - **No double admission**: every parked submission is woken at most once.
//! - **Failure isolation**: a task that fails, panics or is cancelled still releases
//!   its slot; its error is reported only to its own caller.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prometheus_scheduler::core::Scheduler;
//! use prometheus_scheduler::runtime::TokioSpawner;
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new(2)?;
//!
//! // Inline: wait for a slot, run, release.
//! let len = scheduler
//!     .submit(|| async { Ok::<_, std::io::Error>("hello".len()) })
//!     .await?;
//!
//! // Background: arrival order fixed now, execution on the spawner.
//! let spawner = TokioSpawner::current();
//! let handle = scheduler.spawn_on(&spawner, || async {
//!     tokio::time::sleep(Duration::from_millis(500)).await;
//!     Ok::<_, anyhow::Error>(2)
//! });
//! let value = handle.join().await?;
//! ```
//!
//! Configuration can come from JSON ([`config::SchedulerConfig::from_json_str`]) or the
//! environment ([`config::PoolConfig::from_env`]); see [`builders`] for turning it into
//! schedulers.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct schedulers from configuration.
pub mod builders;
/// Configuration models for schedulers.
pub mod config;
/// Core scheduling abstractions and capacity accounting.
pub mod core;
/// Runtime adapters (spawning, timers) and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{AppResult, Permit, Scheduler, SchedulerError, Task};
