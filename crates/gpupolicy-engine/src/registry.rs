//! Name-keyed store of pools and schedule rulesets

use gpupolicy_core::{Policy, Pool, Ruleset};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Insertion-ordered entries keyed by name. Replacing a name keeps its slot.
struct Entries<T> {
    items: Vec<Arc<T>>,
    index: HashMap<String, usize>,
}

impl<T> Entries<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace; returns true when an existing entry was replaced
    fn upsert(&mut self, name: &str, item: T) -> bool {
        let item = Arc::new(item);
        match self.index.get(name) {
            Some(&slot) => {
                self.items[slot] = item;
                true
            }
            None => {
                self.index.insert(name.to_string(), self.items.len());
                self.items.push(item);
                false
            }
        }
    }

    fn get(&self, name: &str) -> Option<Arc<T>> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.items[slot]))
    }

    fn snapshot(&self) -> Vec<Arc<T>> {
        self.items.clone()
    }
}

struct RegistryState {
    pools: Entries<Pool>,
    schedules: Entries<Ruleset>,
}

/// Registry of pools and rulesets.
///
/// A single reader-writer lock guards both maps: registrations take the
/// write side, lookups and listings take the read side and return shared
/// snapshots, so readers never observe a half-applied registration.
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                pools: Entries::new(),
                schedules: Entries::new(),
            }),
        }
    }

    /// Register a pool, replacing any pool with the same name
    pub fn register_pool(&self, pool: Pool) {
        let name = pool.name().to_string();
        let replaced = self.state.write().pools.upsert(&name, pool);
        info!(pool = %name, replaced, "Registered pool");
    }

    /// Register a ruleset, replacing any ruleset with the same name
    pub fn register_schedule(&self, ruleset: Ruleset) {
        let name = ruleset.name().to_string();
        let rules = ruleset.rules().len();
        let replaced = self.state.write().schedules.upsert(&name, ruleset);
        info!(schedule = %name, rules, replaced, "Registered schedule");
    }

    /// Register every pool and ruleset of a policy, in document order
    pub fn load_policy(&self, policy: &Policy) {
        {
            let mut state = self.state.write();
            for pool in policy.pools() {
                let replaced = state.pools.upsert(pool.name(), pool.clone());
                debug!(pool = %pool.name(), replaced, "Registered pool");
            }
            for ruleset in policy.schedules() {
                let replaced = state.schedules.upsert(ruleset.name(), ruleset.clone());
                debug!(schedule = %ruleset.name(), replaced, "Registered schedule");
            }
        }

        info!(
            policy = %policy.name(),
            version = %policy.version(),
            pools = policy.pools().len(),
            schedules = policy.schedules().len(),
            "Loaded policy"
        );
    }

    pub fn get_pool(&self, name: &str) -> Option<Arc<Pool>> {
        self.state.read().pools.get(name)
    }

    pub fn get_schedule(&self, name: &str) -> Option<Arc<Ruleset>> {
        self.state.read().schedules.get(name)
    }

    /// All pools in registration order
    pub fn list_pools(&self) -> Vec<Arc<Pool>> {
        self.state.read().pools.snapshot()
    }

    /// All rulesets in registration order
    pub fn list_schedules(&self) -> Vec<Arc<Ruleset>> {
        self.state.read().schedules.snapshot()
    }

    pub fn pool_count(&self) -> usize {
        self.state.read().pools.items.len()
    }

    pub fn schedule_count(&self) -> usize {
        self.state.read().schedules.items.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
