//! Consumers of published updates.
//!
//! Every subscriber implements the [`Subscriber`] capability. Two stock
//! implementations are provided:
//! - [`StoreSubscriber`]: keeps full values behind a pluggable version gate
//! - [`VersionTracker`]: keeps only the newest version per item
//!
//! # Example
//!
//! ```ignore
//! let nse = Arc::new(Publisher::new("NSE"));
//! let bot = Arc::new(StoreSubscriber::new("bot"));
//! bot.subscribe_to(&nse);
//!
//! nse.publish("AMZN", 100.0, 1, "INR")?;
//! assert_eq!(bot.value("AMZN").unwrap().version(), Version(1));
//! ```

mod handler;
mod store;
mod store_subscriber;
mod version_tracker;

pub use handler::{Subscriber, UpdateOutcome};
pub use store::VersionedStore;
pub use store_subscriber::{StoreSubscriber, SubscriberStats};
pub use version_tracker::VersionTracker;
