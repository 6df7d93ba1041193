//! The subscriber capability interface.

use crate::error::Result;
use crate::gate::GateDecision;
use crate::types::{SubscriberId, UpdateEvent, Version};
use serde::{Deserialize, Serialize};

/// What a subscriber did with a delivered update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The update was stored, replacing `previous` if there was one.
    Accepted { previous: Option<Version> },
    /// The update was stale and discarded; `held` is what stays stored.
    Rejected { held: Version },
}

impl From<GateDecision> for UpdateOutcome {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Accept { previous } => UpdateOutcome::Accepted { previous },
            GateDecision::Reject { held } => UpdateOutcome::Rejected { held },
        }
    }
}

/// Anything that can receive updates from a publisher.
///
/// `on_update` is called by publishers only, possibly from several threads at
/// once. Returning `Err` marks a genuine delivery failure; a stale version is
/// `Ok(UpdateOutcome::Rejected { .. })`.
pub trait Subscriber: Send + Sync {
    /// Stable identity used for registry deduplication.
    fn id(&self) -> SubscriberId;

    fn name(&self) -> &str;

    fn on_update(&self, event: &UpdateEvent) -> Result<UpdateOutcome>;
}
