//! Publisher broadcasting versioned updates to its registry.

use crate::error::{DeliveryFailure, HeraldError, Result};
use crate::subscribers::{Subscriber, UpdateOutcome};
use crate::types::{ItemId, PublisherId, SubscriberId, UnitTag, UpdateEvent, Value, Version};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::registry::SubscriptionRegistry;
use super::types::{DeliveryManifest, DeliveryOutcome, DeliveryReport, FanOut, PublisherConfig};

/// Delivery timeout used by `Publisher::with_timeout`.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// A delivery running on a worker thread.
struct PendingDelivery {
    subscriber: Arc<dyn Subscriber>,
    started: Instant,
    receiver: Receiver<Result<UpdateOutcome>>,
}

/// A source of updates, e.g. one exchange feed.
///
/// All publishers share one version space per item; a subscriber listening
/// to several of them resolves conflicts with its own gate.
pub struct Publisher {
    id: PublisherId,
    name: String,
    config: PublisherConfig,
    registry: SubscriptionRegistry,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PublisherConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: PublisherConfig) -> Self {
        Self {
            id: PublisherId::next(),
            name: name.into(),
            config,
            registry: SubscriptionRegistry::new(),
        }
    }

    /// Sequential publisher with the default per-delivery timeout.
    pub fn with_timeout(name: impl Into<String>) -> Self {
        Self::with_config(
            name,
            PublisherConfig::default().with_delivery_timeout(DEFAULT_DELIVERY_TIMEOUT),
        )
    }

    pub fn id(&self) -> PublisherId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Register a subscriber. Returns false if it was already registered,
    /// in which case nothing changes.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        let added = self.registry.insert(subscriber);
        trace!(publisher = %self.name, subscriber = %id, added, "subscribe");
        added
    }

    /// Deregister a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, subscriber: SubscriberId) -> bool {
        let removed = self.registry.remove(subscriber);
        trace!(publisher = %self.name, subscriber = %subscriber, removed, "unsubscribe");
        removed
    }

    /// Current subscribers in registration order.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        self.registry.ids()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_subscribed(&self, subscriber: SubscriberId) -> bool {
        self.registry.contains(subscriber)
    }

    /// Validate, build and broadcast one update.
    ///
    /// Fails only on invalid input, before anything is delivered. Per
    /// subscriber failures are reported in the manifest instead.
    pub fn publish(
        &self,
        item: impl Into<ItemId>,
        magnitude: f64,
        version: u64,
        unit: impl Into<UnitTag>,
    ) -> Result<DeliveryManifest> {
        let value = Value::new(Version(version), magnitude, unit)?;
        Ok(self.publish_event(UpdateEvent::new(item, value)))
    }

    /// Broadcast an already constructed event to a snapshot of the registry.
    pub fn publish_event(&self, event: UpdateEvent) -> DeliveryManifest {
        let event = Arc::new(event);
        let targets = self.registry.snapshot();

        debug!(
            publisher = %self.name,
            item = %event.item(),
            version = %event.version(),
            subscribers = targets.len(),
            "broadcasting update"
        );

        let results: Vec<(Arc<dyn Subscriber>, Result<UpdateOutcome>)> =
            if !self.config.uses_workers() {
                targets
                    .into_iter()
                    .map(|sub| {
                        let result = invoke(sub.as_ref(), &event, self.config.catch_panics);
                        (sub, result)
                    })
                    .collect()
            } else if self.config.fan_out == FanOut::Parallel {
                let pending: Vec<_> = targets
                    .into_iter()
                    .map(|sub| self.spawn_delivery(sub, &event))
                    .collect();
                pending.into_iter().map(|p| self.await_delivery(p)).collect()
            } else {
                targets
                    .into_iter()
                    .map(|sub| {
                        let pending = self.spawn_delivery(sub, &event);
                        self.await_delivery(pending)
                    })
                    .collect()
            };

        let reports = results
            .into_iter()
            .map(|(sub, result)| self.report(sub.as_ref(), result))
            .collect();

        DeliveryManifest {
            publisher: self.id,
            publisher_name: self.name.clone(),
            event: event.as_ref().clone(),
            reports,
        }
    }

    fn spawn_delivery(
        &self,
        subscriber: Arc<dyn Subscriber>,
        event: &Arc<UpdateEvent>,
    ) -> PendingDelivery {
        let (sender, receiver) = bounded(1);
        let worker_sub = Arc::clone(&subscriber);
        let worker_event = Arc::clone(event);
        let catch_panics = self.config.catch_panics;
        let started = Instant::now();

        let spawned = thread::Builder::new()
            .name(format!("herald-{}-{}", self.id, subscriber.id()))
            .spawn(move || {
                let result = invoke(worker_sub.as_ref(), &worker_event, catch_panics);
                // Receiver may be gone after a timeout
                let _ = sender.send(result);
            });

        if let Err(e) = spawned {
            // The sender was dropped with the closure, so the wait below
            // reports WorkerLost.
            warn!(
                publisher = %self.name,
                subscriber = %subscriber.id(),
                error = %e,
                "failed to spawn delivery worker"
            );
        }

        PendingDelivery {
            subscriber,
            started,
            receiver,
        }
    }

    fn await_delivery(
        &self,
        pending: PendingDelivery,
    ) -> (Arc<dyn Subscriber>, Result<UpdateOutcome>) {
        // A timeout too large to form an Instant waits without a deadline
        let deadline = self
            .config
            .delivery_timeout
            .and_then(|timeout| pending.started.checked_add(timeout).map(|d| (timeout, d)));

        let result = match deadline {
            Some((timeout, deadline)) => match pending.receiver.recv_deadline(deadline) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(HeraldError::TimedOut(timeout)),
                Err(RecvTimeoutError::Disconnected) => Err(HeraldError::WorkerLost),
            },
            None => pending
                .receiver
                .recv()
                .unwrap_or(Err(HeraldError::WorkerLost)),
        };
        (pending.subscriber, result)
    }

    fn report(&self, subscriber: &dyn Subscriber, result: Result<UpdateOutcome>) -> DeliveryReport {
        let outcome = match result {
            Ok(outcome) => DeliveryOutcome::from(outcome),
            Err(e) => {
                warn!(
                    publisher = %self.name,
                    subscriber = %subscriber.name(),
                    subscriber_id = %subscriber.id(),
                    error = %e,
                    outcome = "failed",
                    "delivery failed"
                );
                DeliveryOutcome::Failed {
                    failure: DeliveryFailure::from(e),
                }
            }
        };

        DeliveryReport {
            subscriber: subscriber.id(),
            name: subscriber.name().to_string(),
            outcome,
        }
    }
}

/// Call a subscriber's handler, optionally turning a panic into an error.
fn invoke(
    subscriber: &dyn Subscriber,
    event: &UpdateEvent,
    catch_panics: bool,
) -> Result<UpdateOutcome> {
    if !catch_panics {
        return subscriber.on_update(event);
    }

    panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_update(event)))
        .unwrap_or_else(|payload| Err(HeraldError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
