//! Seen-set of delivered fingerprints.
//!
//! The set lives for the process lifetime and never evicts. A fingerprint is
//! only marked after its delivery is confirmed, so a failed delivery leaves
//! the item eligible for the next cycle. Failure counters are kept only for
//! items still present in the latest fetch.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::publish::fingerprint::Fingerprint;

#[derive(Debug, Default)]
struct DedupInner {
    seen: HashSet<Fingerprint>,
    /// Consecutive delivery failures per not-yet-seen fingerprint.
    failures: HashMap<Fingerprint, u32>,
}

/// Process-lifetime dedup store.
#[derive(Debug, Default)]
pub struct DedupStore {
    inner: Mutex<DedupInner>,
}

impl DedupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DedupInner> {
        // No method can leave the sets half-updated, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `fp` has not been delivered yet.
    pub fn is_new(&self, fp: &Fingerprint) -> bool {
        !self.lock().seen.contains(fp)
    }

    /// Mark `fp` as delivered. Idempotent.
    pub fn mark_seen(&self, fp: Fingerprint) {
        let mut inner = self.lock();
        inner.failures.remove(&fp);
        inner.seen.insert(fp);
    }

    /// Record a failed delivery of `fp`, returning the consecutive failure count.
    pub fn record_failure(&self, fp: Fingerprint) -> u32 {
        let mut inner = self.lock();
        let count = inner.failures.entry(fp).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop failure counters for fingerprints not in `live`.
    pub fn prune_failures<'a>(&self, live: impl IntoIterator<Item = &'a Fingerprint>) {
        let live: HashSet<&Fingerprint> = live.into_iter().collect();
        self.lock().failures.retain(|fp, _| live.contains(fp));
    }

    /// Consecutive failed deliveries of `fp`.
    pub fn failure_count(&self, fp: &Fingerprint) -> u32 {
        self.lock().failures.get(fp).copied().unwrap_or(0)
    }

    /// Number of delivered fingerprints.
    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    /// Whether nothing has been delivered yet.
    pub fn is_empty(&self) -> bool {
        self.lock().seen.is_empty()
    }
}
