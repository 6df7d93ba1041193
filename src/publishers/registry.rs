//! Insertion-ordered subscriber registry with snapshot reads.

use crate::subscribers::Subscriber;
use crate::types::SubscriberId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Internal registration entry.
struct Registration {
    id: SubscriberId,
    subscriber: Arc<dyn Subscriber>,
}

/// The set of subscribers interested in one publisher.
///
/// Membership is unique by `SubscriberId`. Broadcasts never iterate the live
/// list: they take a [`snapshot`](Self::snapshot) and release the lock before
/// delivering.
pub struct SubscriptionRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Add a subscriber. Returns false if it was already registered.
    pub fn insert(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id == id) {
            return false;
        }
        entries.push(Registration { id, subscriber });
        true
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Handles of the current members, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.entries
            .read()
            .iter()
            .map(|e| Arc::clone(&e.subscriber))
            .collect()
    }

    pub fn ids(&self) -> Vec<SubscriberId> {
        self.entries.read().iter().map(|e| e.id).collect()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.read().iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
