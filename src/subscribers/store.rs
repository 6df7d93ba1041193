//! Per-subscriber version-gated value store.

use crate::gate::{GateDecision, VersionGate};
use crate::types::{ItemId, UpdateEvent, Value};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Latest accepted value per item, owned by exactly one subscriber.
///
/// The gate decision and the write happen under one lock, so concurrent
/// deliveries for the same item are linearizable.
pub struct VersionedStore {
    values: Mutex<HashMap<ItemId, Value>>,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Run `gate` against the stored value and write on accept.
    pub fn apply(&self, event: &UpdateEvent, gate: &dyn VersionGate) -> GateDecision {
        let mut values = self.values.lock();
        let decision = gate.decide(values.get(event.item()), event.value());
        if decision.is_accept() {
            values.insert(event.item().clone(), event.value().clone());
        }
        decision
    }

    pub fn get(&self, item: &ItemId) -> Option<Value> {
        self.values.lock().get(item).cloned()
    }

    /// Owned copy of every stored value.
    pub fn snapshot(&self) -> HashMap<ItemId, Value> {
        self.values.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}
