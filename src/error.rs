//! Error types for publish/subscribe operations.

use crate::types::SubscriberId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Main error type for herald operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HeraldError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Subscriber {subscriber} failed to handle update: {reason}")]
    Handler {
        subscriber: SubscriberId,
        reason: String,
    },

    #[error("Delivery timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Subscriber handler panicked: {0}")]
    Panicked(String),

    #[error("Delivery worker exited without reporting")]
    WorkerLost,
}

impl HeraldError {
    /// Convenience constructor for handler failures raised by a subscriber.
    pub fn handler(subscriber: SubscriberId, reason: impl Into<String>) -> Self {
        HeraldError::Handler {
            subscriber,
            reason: reason.into(),
        }
    }
}

/// Result type for herald operations.
pub type Result<T> = std::result::Result<T, HeraldError>;

/// Why a single delivery in a broadcast failed.
///
/// This is the per-subscriber record kept in a delivery manifest. Version
/// rejections never show up here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryFailure {
    /// The handler returned an error.
    Handler { reason: String },
    /// The handler did not finish within the delivery timeout.
    TimedOut { after_ms: u64 },
    /// The handler panicked.
    Panicked { message: String },
    /// The delivery worker disappeared without a result.
    WorkerLost,
}

impl From<HeraldError> for DeliveryFailure {
    fn from(e: HeraldError) -> Self {
        match e {
            HeraldError::Handler { reason, .. } => DeliveryFailure::Handler { reason },
            HeraldError::InvalidArgument(reason) => DeliveryFailure::Handler { reason },
            HeraldError::TimedOut(after) => DeliveryFailure::TimedOut {
                after_ms: after.as_millis() as u64,
            },
            HeraldError::Panicked(message) => DeliveryFailure::Panicked { message },
            HeraldError::WorkerLost => DeliveryFailure::WorkerLost,
        }
    }
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryFailure::Handler { reason } => write!(f, "handler error: {}", reason),
            DeliveryFailure::TimedOut { after_ms } => write!(f, "timed out after {}ms", after_ms),
            DeliveryFailure::Panicked { message } => write!(f, "handler panicked: {}", message),
            DeliveryFailure::WorkerLost => write!(f, "delivery worker lost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_from_error() {
        let err = HeraldError::handler(SubscriberId(7), "boom");
        assert_eq!(err.to_string(), "Subscriber 7 failed to handle update: boom");
        assert_eq!(
            DeliveryFailure::from(err),
            DeliveryFailure::Handler {
                reason: "boom".to_string()
            }
        );

        let timed_out = DeliveryFailure::from(HeraldError::TimedOut(Duration::from_millis(250)));
        assert_eq!(timed_out, DeliveryFailure::TimedOut { after_ms: 250 });
    }
}
