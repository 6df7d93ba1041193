//! Lightweight subscriber that only tracks versions.

use crate::error::Result;
use crate::types::{ItemId, SubscriberId, UpdateEvent, Version};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use super::handler::{Subscriber, UpdateOutcome};

/// Keeps the newest version seen per item and nothing else.
///
/// Useful for portfolio-style consumers that only need to know whether
/// they are up to date.
pub struct VersionTracker {
    id: SubscriberId,
    name: String,
    versions: Mutex<HashMap<ItemId, Version>>,
}

impl VersionTracker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SubscriberId::next(),
            name: name.into(),
            versions: Mutex::new(HashMap::new()),
        }
    }

    pub fn version(&self, item: impl Into<ItemId>) -> Option<Version> {
        self.versions.lock().get(&item.into()).copied()
    }

    pub fn versions(&self) -> HashMap<ItemId, Version> {
        self.versions.lock().clone()
    }
}

impl Subscriber for VersionTracker {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_update(&self, event: &UpdateEvent) -> Result<UpdateOutcome> {
        let incoming = event.version();
        let mut versions = self.versions.lock();

        let outcome = match versions.get(event.item()).copied() {
            Some(held) if incoming <= held => {
                debug!(
                    subscriber = %self.name,
                    item = %event.item(),
                    version = %incoming,
                    held = %held,
                    outcome = "rejected",
                    "stale update ignored"
                );
                UpdateOutcome::Rejected { held }
            }
            previous => {
                versions.insert(event.item().clone(), incoming);
                debug!(
                    subscriber = %self.name,
                    item = %event.item(),
                    version = %incoming,
                    previous = ?previous,
                    "update accepted"
                );
                UpdateOutcome::Accepted { previous }
            }
        };

        Ok(outcome)
    }
}
