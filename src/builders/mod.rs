//! Builders to construct schedulers from configuration.

pub mod pool_builder;

pub use pool_builder::{build_schedulers, SchedulerBuilder};
