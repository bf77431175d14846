//! # Content units and cached items.
//!
//! - [`ContentType`] closed set of loadable content kinds with a fixed cyclic order.
//! - [`SourceUnit`] one addressable source (type + source id).
//! - [`ContentHandle`] opaque loaded payload; only a [`Presenter`](crate::Presenter) looks inside.
//! - [`CachedItem`] a loaded unit sitting in the pool.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Kind of loadable content.
///
/// Cyclic order: `Reward → Interstitial → Splash → Reward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Rewarded full-screen content (primary type).
    Reward,
    /// Interstitial full-screen content.
    Interstitial,
    /// Splash content.
    Splash,
}

impl ContentType {
    /// All types in cyclic order, starting from `Reward`.
    pub const ALL: [ContentType; 3] = [
        ContentType::Reward,
        ContentType::Interstitial,
        ContentType::Splash,
    ];

    /// Returns the next type in cyclic order.
    #[inline]
    pub fn next(self) -> ContentType {
        match self {
            ContentType::Reward => ContentType::Interstitial,
            ContentType::Interstitial => ContentType::Splash,
            ContentType::Splash => ContentType::Reward,
        }
    }

    /// Returns a short stable label (snake_case).
    pub fn as_label(self) -> &'static str {
        match self {
            ContentType::Reward => "reward",
            ContentType::Interstitial => "interstitial",
            ContentType::Splash => "splash",
        }
    }

    /// Returns the analytics prefix used for per-type load events.
    pub fn analytics_prefix(self) -> &'static str {
        match self {
            ContentType::Reward => "Reward",
            ContentType::Interstitial => "Interstitial",
            ContentType::Splash => "Splash",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One addressable source of loadable content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUnit {
    /// Content type of this source.
    pub kind: ContentType,
    /// Source identifier (placement id).
    pub source_id: Arc<str>,
}

impl SourceUnit {
    /// Creates a new source unit.
    pub fn new(kind: ContentType, source_id: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
        }
    }
}

/// Opaque handle to loaded content.
///
/// The runtime never inspects the payload; presenters recover their own
/// concrete type through [`ContentHandle::downcast_ref`].
#[derive(Clone)]
pub struct ContentHandle(Arc<dyn Any + Send + Sync>);

impl ContentHandle {
    /// Wraps a loader-specific payload.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(payload))
    }

    /// Returns the payload if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentHandle(..)")
    }
}

/// Loaded content waiting in the pool.
#[derive(Debug, Clone)]
pub struct CachedItem {
    /// Source the content was loaded from.
    pub unit: SourceUnit,
    /// Opaque loaded payload.
    pub handle: ContentHandle,
    /// When the load completed.
    pub loaded_at: SystemTime,
}

impl CachedItem {
    /// Creates an item stamped with the current time.
    pub fn new(unit: SourceUnit, handle: ContentHandle) -> Self {
        Self {
            unit,
            handle,
            loaded_at: SystemTime::now(),
        }
    }

    /// Content type of the item.
    #[inline]
    pub fn kind(&self) -> ContentType {
        self.unit.kind
    }

    /// Source identifier of the item.
    #[inline]
    pub fn source_id(&self) -> &str {
        &self.unit.source_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_order_wraps_to_reward() {
        assert_eq!(ContentType::Reward.next(), ContentType::Interstitial);
        assert_eq!(ContentType::Interstitial.next(), ContentType::Splash);
        assert_eq!(ContentType::Splash.next(), ContentType::Reward);
    }

    #[test]
    fn handle_downcasts_to_payload_type_only() {
        let handle = ContentHandle::new(42u32);
        assert_eq!(handle.downcast_ref::<u32>(), Some(&42));
        assert!(handle.downcast_ref::<String>().is_none());
    }
}
