//! Publisher configuration and delivery manifests.

use crate::error::DeliveryFailure;
use crate::subscribers::UpdateOutcome;
use crate::types::{PublisherId, SubscriberId, UpdateEvent, Version};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a broadcast walks its subscriber snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FanOut {
    /// One subscriber at a time, in registration order.
    #[default]
    Sequential,
    /// Every delivery on its own worker thread. Reports are still collected
    /// in registration order.
    Parallel,
}

/// Configuration for a publisher.
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    /// Fan-out strategy.
    /// Default: Sequential
    pub fan_out: FanOut,

    /// Upper bound on a single subscriber delivery (None = wait forever).
    /// With `Sequential` and no timeout, handlers run on the caller's thread.
    /// Default: None
    pub delivery_timeout: Option<Duration>,

    /// Turn handler panics into delivery failures.
    /// Default: true
    pub catch_panics: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            fan_out: FanOut::Sequential,
            delivery_timeout: None,
            catch_panics: true,
        }
    }
}

impl PublisherConfig {
    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = Some(timeout);
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// True when deliveries have to leave the caller's thread.
    pub(crate) fn uses_workers(&self) -> bool {
        self.fan_out == FanOut::Parallel || self.delivery_timeout.is_some()
    }
}

/// Result of delivering one event to one subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Stored by the subscriber.
    Accepted { previous: Option<Version> },
    /// Discarded by the subscriber's version gate. Not a fault.
    Rejected { held: Version },
    /// The handler errored, panicked or timed out.
    Failed { failure: DeliveryFailure },
}

impl DeliveryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed { .. })
    }
}

impl From<UpdateOutcome> for DeliveryOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Accepted { previous } => DeliveryOutcome::Accepted { previous },
            UpdateOutcome::Rejected { held } => DeliveryOutcome::Rejected { held },
        }
    }
}

/// Per-subscriber line of a manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub subscriber: SubscriberId,
    pub name: String,
    pub outcome: DeliveryOutcome,
}

/// Everything that happened during one broadcast.
///
/// Holds exactly one report per subscriber in the broadcast snapshot, in
/// registration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryManifest {
    pub publisher: PublisherId,
    pub publisher_name: String,
    pub event: UpdateEvent,
    pub reports: Vec<DeliveryReport>,
}

impl DeliveryManifest {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn accepted(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Accepted { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Rejected { .. }))
    }

    /// Failed deliveries with the subscriber they belong to.
    pub fn failures(&self) -> Vec<(SubscriberId, &DeliveryFailure)> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                DeliveryOutcome::Failed { failure } => Some((r.subscriber, failure)),
                _ => None,
            })
            .collect()
    }

    /// No delivery failed. Rejections do not count against this.
    pub fn is_clean(&self) -> bool {
        !self.reports.iter().any(|r| r.outcome.is_failure())
    }

    pub fn outcome_for(&self, subscriber: SubscriberId) -> Option<&DeliveryOutcome> {
        self.reports
            .iter()
            .find(|r| r.subscriber == subscriber)
            .map(|r| &r.outcome)
    }

    /// Subscribers in the order they were reported.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        self.reports.iter().map(|r| r.subscriber).collect()
    }

    fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&DeliveryOutcome) -> bool,
    {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn manifest() -> DeliveryManifest {
        let event = UpdateEvent::new("AMZN", Value::new(Version(2), 200.0, "INR").unwrap());
        DeliveryManifest {
            publisher: PublisherId(1),
            publisher_name: "NSE".to_string(),
            event,
            reports: vec![
                DeliveryReport {
                    subscriber: SubscriberId(10),
                    name: "S1".to_string(),
                    outcome: DeliveryOutcome::Accepted {
                        previous: Some(Version(1)),
                    },
                },
                DeliveryReport {
                    subscriber: SubscriberId(11),
                    name: "S2".to_string(),
                    outcome: DeliveryOutcome::Rejected { held: Version(3) },
                },
                DeliveryReport {
                    subscriber: SubscriberId(12),
                    name: "S3".to_string(),
                    outcome: DeliveryOutcome::Failed {
                        failure: DeliveryFailure::TimedOut { after_ms: 50 },
                    },
                },
            ],
        }
    }

    #[test]
    fn test_manifest_counts() {
        let m = manifest();
        assert_eq!(m.len(), 3);
        assert_eq!(m.accepted(), 1);
        assert_eq!(m.rejected(), 1);
        assert_eq!(m.failures().len(), 1);
        assert_eq!(m.failures()[0].0, SubscriberId(12));
        assert!(!m.is_clean());
        assert_eq!(
            m.outcome_for(SubscriberId(11)),
            Some(&DeliveryOutcome::Rejected { held: Version(3) })
        );
        assert_eq!(m.outcome_for(SubscriberId(99)), None);
    }

    #[test]
    fn test_rejection_and_failure_serialize_differently() {
        let m = manifest();
        let json = serde_json::to_value(&m).unwrap();

        assert_eq!(json["reports"][1]["outcome"]["status"], "rejected");
        assert_eq!(json["reports"][2]["outcome"]["status"], "failed");
        assert_eq!(json["reports"][2]["outcome"]["failure"]["kind"], "timed_out");
    }

    #[test]
    fn test_config_defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.fan_out, FanOut::Sequential);
        assert!(config.delivery_timeout.is_none());
        assert!(config.catch_panics);
        assert!(!config.uses_workers());

        let config = config.with_delivery_timeout(Duration::from_millis(5));
        assert!(config.uses_workers());
    }
}
