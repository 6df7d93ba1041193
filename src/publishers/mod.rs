//! Publishers and their subscription registries.
//!
//! A publisher turns a raw `(item, magnitude, version, unit)` call into an
//! immutable [`UpdateEvent`](crate::types::UpdateEvent) and delivers it to a
//! snapshot of its registry. Each broadcast returns a [`DeliveryManifest`]
//! with one report per subscriber:
//! - `Accepted`: the subscriber stored the value
//! - `Rejected`: the subscriber already held an equal or newer version
//! - `Failed`: the handler errored, panicked or timed out
//!
//! Failures are isolated: one bad subscriber never stops delivery to the
//! others, and never fails the publish call.
//!
//! # Example
//!
//! ```ignore
//! let bse = Publisher::with_config(
//!     "BSE",
//!     PublisherConfig::default().with_delivery_timeout(Duration::from_millis(200)),
//! );
//! bse.subscribe(tracker.clone());
//!
//! let manifest = bse.publish("TSLA", 300.0, 1, "INR")?;
//! for (subscriber, failure) in manifest.failures() {
//!     eprintln!("{} failed: {}", subscriber, failure);
//! }
//! ```

mod publisher;
mod registry;
mod types;

pub use publisher::{Publisher, DEFAULT_DELIVERY_TIMEOUT};
pub use registry::SubscriptionRegistry;
pub use types::{DeliveryManifest, DeliveryOutcome, DeliveryReport, FanOut, PublisherConfig};
