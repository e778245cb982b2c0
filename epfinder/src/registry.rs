// epfinder/src/registry.rs
//
// Output registry: named EpInfo slots under one namespace (the algo node,
// EVENT_PLANE by default). Slots are created at init and looked up by key
// every event; the accumulator writes into them in place and the sink reads
// them back out.
//
// DashMap keyed by slot name, each slot behind its own RwLock. Handles are
// Arc clones and stay valid after the map guard is released.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::events::EpInfo;

pub type SlotHandle = Arc<RwLock<EpInfo>>;

pub struct Registry {
    namespace: String,
    slots:     DashMap<String, SlotHandle>,
}

impl Registry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), slots: DashMap::new() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Creates `key` with `initial`. An existing slot of the same name is
    /// kept as is.
    pub fn create(&self, key: &str, initial: EpInfo) -> SlotHandle {
        let handle = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!("Registry {}: created slot {}", self.namespace, key);
                Arc::new(RwLock::new(initial))
            });
        Arc::clone(handle.value())
    }

    pub fn lookup(&self, key: &str) -> Option<SlotHandle> {
        self.slots.get(key).map(|s| Arc::clone(s.value()))
    }

    /// Slot names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.iter().map(|s| s.key().clone()).collect();
        keys.sort();
        keys
    }
}
