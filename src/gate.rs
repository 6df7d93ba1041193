//! Staleness policies deciding whether an incoming value replaces a stored one.

use crate::types::{Value, Version};

/// Outcome of running a gate against a subscriber's stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Store the incoming value. `previous` is the version it replaces.
    Accept { previous: Option<Version> },
    /// Leave the store unchanged. `held` is the version already stored.
    Reject { held: Version },
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept { .. })
    }
}

/// Pluggable accept/reject policy.
///
/// Implementations must be pure: the caller holds the store lock while
/// `decide` runs and performs the mutation itself.
pub trait VersionGate: Send + Sync {
    fn decide(&self, stored: Option<&Value>, incoming: &Value) -> GateDecision;

    /// Short policy name for logs.
    fn name(&self) -> &'static str;
}

/// Default policy: first value is always accepted, after that only a
/// strictly greater version replaces the stored one.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictlyNewer;

impl VersionGate for StrictlyNewer {
    fn decide(&self, stored: Option<&Value>, incoming: &Value) -> GateDecision {
        match stored {
            None => GateDecision::Accept { previous: None },
            Some(held) if incoming.version() > held.version() => GateDecision::Accept {
                previous: Some(held.version()),
            },
            Some(held) => GateDecision::Reject {
                held: held.version(),
            },
        }
    }

    fn name(&self) -> &'static str {
        "strictly_newer"
    }
}

/// Last-write-wins on ties: an equal version also replaces the stored value.
/// Older versions are still rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewerOrEqual;

impl VersionGate for NewerOrEqual {
    fn decide(&self, stored: Option<&Value>, incoming: &Value) -> GateDecision {
        match stored {
            None => GateDecision::Accept { previous: None },
            Some(held) if incoming.version() >= held.version() => GateDecision::Accept {
                previous: Some(held.version()),
            },
            Some(held) => GateDecision::Reject {
                held: held.version(),
            },
        }
    }

    fn name(&self) -> &'static str {
        "newer_or_equal"
    }
}
