//! Configuration models for schedulers.

pub mod pool;

pub use pool::{PoolConfig, SchedulerConfig, ADMISSION_TIMEOUT_ENV, CAPACITY_ENV};
