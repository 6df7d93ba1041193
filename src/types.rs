//! Core types for versioned updates.

use crate::error::{HeraldError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_PUBLISHER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a tracked item (e.g. a ticker symbol).
///
/// The engine only hashes and compares these; it never looks inside.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(Arc<str>);

impl ItemId {
    pub fn new(id: impl AsRef<str>) -> Self {
        ItemId(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::new(s)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(Arc::from(s))
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque unit tag carried alongside a magnitude (e.g. a currency code).
///
/// Carried through unchanged and never interpreted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTag(Arc<str>);

impl UnitTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        UnitTag(Arc::from(tag.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitTag {
    fn from(s: &str) -> Self {
        UnitTag::new(s)
    }
}

impl From<String> for UnitTag {
    fn from(s: String) -> Self {
        UnitTag(Arc::from(s))
    }
}

impl From<&UnitTag> for UnitTag {
    fn from(tag: &UnitTag) -> Self {
        tag.clone()
    }
}

impl fmt::Debug for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitTag({})", self.0)
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic version counter. One version space per item, shared by all
/// publishers.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Version(pub u64);

impl Version {
    /// The following version, or `None` at `u64::MAX`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Version)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Version(v)
    }
}

impl TryFrom<i64> for Version {
    type Error = HeraldError;

    fn try_from(v: i64) -> Result<Self> {
        u64::try_from(v)
            .map(Version)
            .map_err(|_| HeraldError::InvalidArgument(format!("negative version: {}", v)))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An immutable versioned value. A change is always a new `Value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Value {
    version: Version,
    magnitude: f64,
    unit: UnitTag,
}

impl Value {
    /// Build a value, rejecting NaN and infinite magnitudes.
    pub fn new(version: Version, magnitude: f64, unit: impl Into<UnitTag>) -> Result<Self> {
        if !magnitude.is_finite() {
            return Err(HeraldError::InvalidArgument(format!(
                "magnitude must be finite, got {}",
                magnitude
            )));
        }
        Ok(Self {
            version,
            magnitude,
            unit: unit.into(),
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &UnitTag {
        &self.unit
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.unit, self.magnitude, self.version)
    }
}

/// The unit of delivery: an item paired with its new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    item: ItemId,
    value: Value,
}

impl UpdateEvent {
    pub fn new(item: impl Into<ItemId>, value: Value) -> Self {
        Self {
            item: item.into(),
            value,
        }
    }

    pub fn item(&self) -> &ItemId {
        &self.item
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn version(&self) -> Version {
        self.value.version
    }
}

impl fmt::Display for UpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.item, self.value)
    }
}

/// Process-unique identity of a subscriber.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    /// Allocate a fresh identity. Custom `Subscriber` impls call this once
    /// at construction.
    pub fn next() -> Self {
        SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberId({})", self.0)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identity of a publisher.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublisherId(pub u64);

impl PublisherId {
    pub fn next() -> Self {
        PublisherId(NEXT_PUBLISHER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublisherId({})", self.0)
    }
}

impl fmt::Display for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
