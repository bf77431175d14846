//! # Content unit registry.
//!
//! Immutable view over the per-type source lists and the target pool size.
//! Built once from a [`FlowConfig`] and shared (`Arc`) with the scheduler.

use std::sync::Arc;

use crate::document::FlowConfig;
use crate::supply::content::{ContentType, SourceUnit};

/// Per-type ordered source lists plus the target pool size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentUnitRegistry {
    reward: Vec<Arc<str>>,
    interstitial: Vec<Arc<str>>,
    splash: Vec<Arc<str>>,
    target_size: usize,
}

impl ContentUnitRegistry {
    /// Creates a registry from explicit lists.
    pub fn new<S: AsRef<str>>(
        reward: &[S],
        interstitial: &[S],
        splash: &[S],
        target_size: usize,
    ) -> Self {
        let collect = |ids: &[S]| ids.iter().map(|s| Arc::from(s.as_ref())).collect();
        Self {
            reward: collect(reward),
            interstitial: collect(interstitial),
            splash: collect(splash),
            target_size,
        }
    }

    /// Creates a registry from a decoded document.
    pub fn from_config(cfg: &FlowConfig) -> Self {
        Self::new(
            cfg.reward_sources.as_slice(),
            cfg.interstitial_sources.as_slice(),
            cfg.splash_sources.as_slice(),
            cfg.target_size,
        )
    }

    /// Returns the ordered source ids for `kind`.
    pub fn sources(&self, kind: ContentType) -> &[Arc<str>] {
        match kind {
            ContentType::Reward => &self.reward,
            ContentType::Interstitial => &self.interstitial,
            ContentType::Splash => &self.splash,
        }
    }

    /// Returns the source unit at `index` for `kind`, if in bounds.
    pub fn unit(&self, kind: ContentType, index: usize) -> Option<SourceUnit> {
        self.sources(kind)
            .get(index)
            .map(|id| SourceUnit::new(kind, Arc::clone(id)))
    }

    /// Number of sources configured for `kind`.
    #[inline]
    pub fn len(&self, kind: ContentType) -> usize {
        self.sources(kind).len()
    }

    /// Target pool size.
    #[inline]
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Number of sources across all types.
    pub fn total(&self) -> usize {
        ContentType::ALL.iter().map(|k| self.len(*k)).sum()
    }

    /// True when no type has any source.
    pub fn is_empty(&self) -> bool {
        ContentType::ALL.iter().all(|k| self.sources(*k).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_lookup_respects_bounds() {
        let reg = ContentUnitRegistry::new(&["r1", "r2"], &[], &["s1"], 2);
        assert_eq!(reg.unit(ContentType::Reward, 1).unwrap().source_id.as_ref(), "r2");
        assert!(reg.unit(ContentType::Reward, 2).is_none());
        assert!(reg.unit(ContentType::Interstitial, 0).is_none());
        assert_eq!(reg.len(ContentType::Splash), 1);
        assert_eq!(reg.total(), 3);
        assert!(!reg.is_empty());
        assert!(ContentUnitRegistry::default().is_empty());
    }
}
