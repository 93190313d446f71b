//! Memoization of transformation results.
//!
//! Keyed by (control id, patient id). Concurrent requests for the same key run the
//! transformation once: the first caller computes, the others block on the same slot
//! and share its result. Entries never expire; they are dropped explicitly through
//! [`TransformCache::invalidate`], [`TransformCache::invalidate_patient`],
//! [`TransformCache::clear`] or a [`CachePolicyListener`] notification.

use crate::transform::TransformReport;
use crate::ParsedMessage;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

type Slot = Arc<OnceCell<Arc<TransformReport>>>;

/// Identifies one transformation result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub control_id: String,
    pub patient_id: Option<String>,
}

impl CacheKey {
    pub fn new(control_id: impl Into<String>, patient_id: Option<String>) -> Self {
        Self {
            control_id: control_id.into(),
            patient_id,
        }
    }

    /// Key for a parsed message; `None` when it has no control id.
    pub fn for_message(parsed: &ParsedMessage) -> Option<Self> {
        let control_id = parsed.control_id()?;
        Some(Self::new(control_id, parsed.patient_id().map(str::to_string)))
    }
}

/// Receives consent/authorization policy changes that affect cached results.
pub trait CachePolicyListener: Send + Sync {
    /// Policy for one patient changed.
    fn patient_policy_changed(&self, patient_id: &str);

    /// All policies were reloaded.
    fn policies_reset(&self);
}

/// Single-flight transform cache.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: DashMap<CacheKey, Slot>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached report for `key`, computing it with `transform` if absent.
    ///
    /// `transform` runs at most once per key while the entry is cached, even under
    /// concurrent calls.
    pub fn get_or_transform<F>(&self, key: CacheKey, transform: F) -> Arc<TransformReport>
    where
        F: FnOnce() -> TransformReport,
    {
        // Clone the slot out so the shard lock is released before computing.
        let slot = self.entries.entry(key).or_default().value().clone();
        slot.get_or_init(|| Arc::new(transform())).clone()
    }

    /// Cached report for `key`, if already computed.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<TransformReport>> {
        self.entries.get(key)?.value().get().cloned()
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry for `patient_id`; returns how many were removed.
    pub fn invalidate_patient(&self, patient_id: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| key.patient_id.as_deref() != Some(patient_id));
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!(patient_id, removed, "invalidated cached transformations");
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CachePolicyListener for TransformCache {
    fn patient_policy_changed(&self, patient_id: &str) {
        self.invalidate_patient(patient_id);
    }

    fn policies_reset(&self) {
        self.clear();
    }
}
