//! Subscriber that keeps the latest accepted value per item.

use crate::error::Result;
use crate::gate::{GateDecision, StrictlyNewer, VersionGate};
use crate::publishers::Publisher;
use crate::types::{ItemId, PublisherId, SubscriberId, UpdateEvent, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::handler::{Subscriber, UpdateOutcome};
use super::store::VersionedStore;

/// Accept/reject counters for one subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    pub accepted: u64,
    pub rejected: u64,
}

/// A subscriber holding full values behind a version gate.
///
/// Typical users are trading bots or dashboards that listen to several
/// publishers and must ignore stale data coming from the slower ones.
pub struct StoreSubscriber {
    id: SubscriberId,
    name: String,
    store: VersionedStore,
    gate: Box<dyn VersionGate>,
    /// Publishers this subscriber registered with, held weakly.
    publishers: Mutex<Vec<(PublisherId, Weak<Publisher>)>>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl StoreSubscriber {
    /// Create a subscriber using the default `StrictlyNewer` gate.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_gate(name, Box::new(StrictlyNewer))
    }

    pub fn with_gate(name: impl Into<String>, gate: Box<dyn VersionGate>) -> Self {
        Self {
            id: SubscriberId::next(),
            name: name.into(),
            store: VersionedStore::new(),
            gate,
            publishers: Mutex::new(Vec::new()),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Register with `publisher` and remember it for bulk unsubscription.
    ///
    /// Subscribing twice to the same publisher has no further effect.
    pub fn subscribe_to(self: &Arc<Self>, publisher: &Arc<Publisher>) {
        let mut publishers = self.publishers.lock();
        let handle: Arc<dyn Subscriber> = Arc::clone(self) as Arc<dyn Subscriber>;
        publisher.subscribe(handle);

        if !publishers.iter().any(|(id, _)| *id == publisher.id()) {
            publishers.push((publisher.id(), Arc::downgrade(publisher)));
        }
    }

    /// Stop receiving from `publisher`. Stored values are kept.
    pub fn unsubscribe_from(&self, publisher: &Publisher) {
        let mut publishers = self.publishers.lock();
        publisher.unsubscribe(self.id);
        publishers.retain(|(id, _)| *id != publisher.id());
    }

    /// Stop receiving from every remembered publisher.
    pub fn unsubscribe_from_all(&self) {
        let mut publishers = self.publishers.lock();
        for (_, weak) in publishers.drain(..) {
            if let Some(publisher) = weak.upgrade() {
                publisher.unsubscribe(self.id);
            }
        }
    }

    /// Remembered publishers that are still alive, in subscription order.
    pub fn publishers(&self) -> Vec<PublisherId> {
        self.publishers
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Latest accepted value for `item`, if any.
    pub fn value(&self, item: impl Into<ItemId>) -> Option<Value> {
        self.store.get(&item.into())
    }

    /// Owned copy of every held value.
    pub fn values(&self) -> HashMap<ItemId, Value> {
        self.store.snapshot()
    }

    /// Held values sorted by item, for printing.
    pub fn holdings(&self) -> Vec<(ItemId, Value)> {
        let mut holdings: Vec<_> = self.store.snapshot().into_iter().collect();
        holdings.sort_by(|a, b| a.0.cmp(&b.0));
        holdings
    }

    pub fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn gate_name(&self) -> &'static str {
        self.gate.name()
    }
}

impl Subscriber for StoreSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_update(&self, event: &UpdateEvent) -> Result<UpdateOutcome> {
        let decision = self.store.apply(event, self.gate.as_ref());

        match decision {
            GateDecision::Accept { previous } => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subscriber = %self.name,
                    item = %event.item(),
                    version = %event.version(),
                    previous = ?previous,
                    "update accepted"
                );
            }
            GateDecision::Reject { held } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subscriber = %self.name,
                    item = %event.item(),
                    version = %event.version(),
                    held = %held,
                    gate = self.gate.name(),
                    outcome = "rejected",
                    "stale update ignored"
                );
            }
        }

        Ok(decision.into())
    }
}
