//! API-facing response models for inspecting schedulers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{Scheduler, SchedulerSnapshot};

/// Pool snapshot data for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool identifier.
    pub name: String,
    /// Scheduler state at the time of listing.
    #[serde(flatten)]
    pub scheduler: SchedulerSnapshot,
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Names of pools disabled by an invariant violation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poisoned: Vec<String>,
}

/// Build pool listings, sorted by name.
pub fn list_pools(pools: &HashMap<String, Scheduler>) -> Vec<PoolSnapshot> {
    let mut listing: Vec<PoolSnapshot> = pools
        .iter()
        .map(|(name, scheduler)| PoolSnapshot {
            name: name.clone(),
            scheduler: scheduler.snapshot(),
        })
        .collect();
    listing.sort_by(|a, b| a.name.cmp(&b.name));
    listing
}

/// Return a health payload; unhealthy if any pool is poisoned.
pub fn health(pools: &HashMap<String, Scheduler>) -> Health {
    let mut poisoned: Vec<String> = pools
        .iter()
        .filter(|(_, scheduler)| scheduler.is_poisoned())
        .map(|(name, _)| name.clone())
        .collect();
    poisoned.sort();
    Health {
        ok: poisoned.is_empty(),
        poisoned,
    }
}
