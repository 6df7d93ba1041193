//! # Herald
//!
//! In-process publish/subscribe for versioned values, where every subscriber
//! keeps its own latest-known value per item and drops stale deliveries by
//! comparing version counters rather than timestamps.
//!
//! ## Core Concepts
//!
//! - **Values**: Immutable `(version, magnitude, unit)` records
//! - **Publishers**: Broadcast update events to a snapshot of their subscribers
//! - **Subscribers**: Version-gated stores, one per consumer
//! - **Gates**: Pluggable accept/reject policies (strict `>` by default)
//!
//! Version numbers form one space per item across all publishers, so a
//! subscriber fed by two sources keeps whichever value is newest no matter
//! which source delivered it first.
//!
//! ## Example
//!
//! ```ignore
//! use herald::{Publisher, StoreSubscriber};
//! use std::sync::Arc;
//!
//! let nse = Arc::new(Publisher::new("NSE"));
//! let bse = Arc::new(Publisher::new("BSE"));
//!
//! let s2 = Arc::new(StoreSubscriber::new("S2"));
//! s2.subscribe_to(&nse);
//! s2.subscribe_to(&bse);
//!
//! nse.publish("AMZN", 200.0, 2, "INR")?;
//! let manifest = bse.publish("AMZN", 100.0, 1, "INR")?;
//! assert_eq!(manifest.rejected(), 1);
//! ```

pub mod error;
pub mod gate;
pub mod publishers;
pub mod subscribers;
pub mod types;

// Re-exports
pub use error::{DeliveryFailure, HeraldError, Result};
pub use gate::{GateDecision, NewerOrEqual, StrictlyNewer, VersionGate};
pub use publishers::{
    DeliveryManifest, DeliveryOutcome, DeliveryReport, FanOut, Publisher, PublisherConfig,
    SubscriptionRegistry, DEFAULT_DELIVERY_TIMEOUT,
};
pub use subscribers::{
    StoreSubscriber, Subscriber, SubscriberStats, UpdateOutcome, VersionTracker, VersionedStore,
};
pub use types::*;
