//! Allocation evaluation: pool admission plus per-request requirements

use gpupolicy_core::{Device, Pool, Requirements};
use std::sync::Arc;
use tracing::debug;

use crate::registry::Registry;

/// Check whether a device satisfies a pool's static admission criteria.
///
/// Device types are matched as case-sensitive substrings of the device name,
/// so a pool listing "RTX" admits "NVIDIA GeForce RTX 4090".
pub fn matches_pool(device: &Device, pool: &Pool) -> bool {
    let accepted = pool.accepted_name_substrings();
    if !accepted.is_empty() && !accepted.iter().any(|t| device.name().contains(t.as_str())) {
        return false;
    }

    if device.memory_gb() < pool.min_memory_gb() {
        return false;
    }

    if device.temperature_c() > pool.max_temp_c() {
        return false;
    }

    // A device bound to a pool cannot be admitted by another one
    if let Some(assigned) = device.assigned_pool() {
        if assigned != pool.name() {
            return false;
        }
    }

    true
}

/// Check whether a device satisfies a caller's requirements
pub fn meets_requirements(device: &Device, requirements: &Requirements) -> bool {
    if let Some(min_memory) = requirements.min_memory() {
        if device.memory_gb() < min_memory {
            return false;
        }
    }

    if let Some(max_temp) = requirements.max_temp() {
        if device.temperature_c() > max_temp {
            return false;
        }
    }

    requirements.tags().is_subset(device.tags())
}

/// Decides whether devices are allocatable under the registered pools
#[derive(Clone)]
pub struct Evaluator {
    registry: Arc<Registry>,
}

impl Evaluator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// First registered pool (in listing order) that admits the device
    /// under the given requirements
    pub fn matching_pool(&self, device: &Device, requirements: &Requirements) -> Option<Arc<Pool>> {
        self.matching_pool_in(&self.registry.list_pools(), device, requirements)
    }

    /// Like [`Evaluator::matching_pool`], but against a registry snapshot
    /// taken by the caller, so a batch of devices sees one set of pools.
    pub fn matching_pool_in(
        &self,
        pools: &[Arc<Pool>],
        device: &Device,
        requirements: &Requirements,
    ) -> Option<Arc<Pool>> {
        // Requirements do not depend on the pool
        if !meets_requirements(device, requirements) {
            debug!(device = device.id(), "Device does not meet requirements");
            return None;
        }

        let found = pools
            .iter()
            .find(|pool| matches_pool(device, pool))
            .cloned();

        match &found {
            Some(pool) => debug!(device = device.id(), pool = %pool.name(), "Device admitted"),
            None => debug!(device = device.id(), "No pool admits device"),
        }

        found
    }

    /// True iff some registered pool admits the device and the device meets the requirements
    pub fn evaluate(&self, device: &Device, requirements: &Requirements) -> bool {
        self.matching_pool(device, requirements).is_some()
    }

    /// Evaluate against a registry snapshot taken by the caller
    pub fn evaluate_in(
        &self,
        pools: &[Arc<Pool>],
        device: &Device,
        requirements: &Requirements,
    ) -> bool {
        self.matching_pool_in(pools, device, requirements).is_some()
    }
}
