//! Scheduler pool configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the concurrency cap.
pub const CAPACITY_ENV: &str = "SCHEDULER_CAPACITY";
/// Environment variable holding the optional admission timeout in milliseconds.
pub const ADMISSION_TIMEOUT_ENV: &str = "SCHEDULER_ADMISSION_TIMEOUT_MS";

/// Configuration of one scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of tasks running at once.
    pub capacity: usize,
    /// How long a submission may wait for a slot; `None` waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_timeout_ms: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: num_cpus::get(),
            admission_timeout_ms: None,
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, PoolConfig>,
}

impl PoolConfig {
    /// Config with the given capacity and no admission timeout.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            admission_timeout_ms: None,
        }
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.admission_timeout_ms == Some(0) {
            return Err("admission_timeout_ms must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Admission timeout as a `Duration`.
    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_ms.map(Duration::from_millis)
    }

    /// Read configuration from the environment, loading a `.env` file first if present.
    ///
    /// Unset variables fall back to [`PoolConfig::default`].
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup and validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(CAPACITY_ENV) {
            cfg.capacity = parse_positive(CAPACITY_ENV, &raw)?;
        }
        if let Some(raw) = lookup(ADMISSION_TIMEOUT_ENV) {
            cfg.admission_timeout_ms = Some(parse_positive(ADMISSION_TIMEOUT_ENV, &raw)?);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}=`{raw}` is not a positive integer: {e}"))
}

impl SchedulerConfig {
    /// Validate all pools and ensure at least one pool exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
