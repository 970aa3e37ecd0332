//! Builders to construct schedulers from configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::{PoolConfig, SchedulerConfig};
use crate::core::{AuditSink, Scheduler, SchedulerError};

/// Step-by-step construction of a single [`Scheduler`].
pub struct SchedulerBuilder {
    config: PoolConfig,
    audit: Option<Box<dyn AuditSink>>,
}

impl SchedulerBuilder {
    /// Start from a capacity.
    pub const fn new(capacity: usize) -> Self {
        Self {
            config: PoolConfig::with_capacity(capacity),
            audit: None,
        }
    }

    /// Start from existing pool configuration.
    pub const fn from_config(config: PoolConfig) -> Self {
        Self {
            config,
            audit: None,
        }
    }

    /// Set the admission timeout.
    #[must_use]
    pub fn admission_timeout(mut self, timeout: Duration) -> Self {
        self.config.admission_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Configuration accumulated so far.
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Configuration` if the configuration is invalid.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let scheduler = Scheduler::from_config(&self.config)?;
        Ok(match self.audit {
            Some(sink) => scheduler.with_audit(sink),
            None => scheduler,
        })
    }
}

/// Build one scheduler per configured pool.
///
/// # Errors
///
/// `SchedulerError::Configuration` if the configuration is invalid.
pub fn build_schedulers(cfg: &SchedulerConfig) -> Result<HashMap<String, Scheduler>, SchedulerError> {
    cfg.validate().map_err(SchedulerError::Configuration)?;

    let mut schedulers = HashMap::with_capacity(cfg.pools.len());
    for (name, pool_cfg) in &cfg.pools {
        let scheduler = SchedulerBuilder::from_config(pool_cfg.clone()).build()?;
        tracing::debug!(pool = %name, scheduler = %scheduler.id(), capacity = pool_cfg.capacity, "pool built");
        schedulers.insert(name.clone(), scheduler);
    }
    Ok(schedulers)
}
