use super::entry::CacheEntry;
use super::key::{BorrowedFingerprint, Fingerprint};
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// How many randomly sampled entries compete when a full tier must evict.
const EVICTION_SAMPLE: usize = 8;

/// Outcome of a single-tier lookup.
pub(super) enum TierLookup {
    Hit(Arc<CacheEntry>),
    /// A hit that had already expired; it was removed from this tier.
    Expired,
    Miss,
}

/// One bounded cache tier with its own lock.
///
/// Lookups take the read lock; insertion and expiry removal take the write
/// lock. Eviction is sampled LRU: a handful of random entries compete and
/// the least recently accessed one loses.
pub(super) struct Tier {
    name: &'static str,
    capacity: usize,
    entries: RwLock<HashMap<Fingerprint, Arc<CacheEntry>, FxBuildHasher>>,
}

impl Tier {
    pub(super) fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity.max(1),
                FxBuildHasher,
            )),
        }
    }

    pub(super) fn name(&self) -> &'static str {
        self.name
    }

    pub(super) fn get(&self, key: &BorrowedFingerprint<'_>, now: Instant) -> TierLookup {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    return TierLookup::Hit(Arc::clone(entry))
                }
                Some(_) => {}
                None => return TierLookup::Miss,
            }
        }

        // Re-check under the write lock; a concurrent put may have
        // replaced the entry with a fresh one in the meantime.
        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                TierLookup::Expired
            }
            Some(entry) => TierLookup::Hit(Arc::clone(entry)),
            None => TierLookup::Miss,
        }
    }

    /// Insert, evicting one sampled-LRU victim if the tier is full.
    /// Returns true when a victim was evicted.
    pub(super) fn insert(&self, key: Fingerprint, entry: Arc<CacheEntry>) -> bool {
        let mut entries = self.entries.write().unwrap();
        let mut evicted = false;
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            evicted = Self::evict_sampled(&mut entries);
        }
        entries.insert(key, entry);
        evicted
    }

    /// Best-effort promotion insert: skipped silently when the write lock
    /// is contended.
    pub(super) fn try_insert(&self, key: Fingerprint, entry: Arc<CacheEntry>) -> bool {
        let Ok(mut entries) = self.entries.try_write() else {
            return false;
        };
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            Self::evict_sampled(&mut entries);
        }
        entries.insert(key, entry);
        true
    }

    fn evict_sampled(entries: &mut HashMap<Fingerprint, Arc<CacheEntry>, FxBuildHasher>) -> bool {
        if entries.is_empty() {
            return false;
        }
        let skip = fastrand::usize(..entries.len());
        let victim = entries
            .iter()
            .cycle()
            .skip(skip)
            .take(EVICTION_SAMPLE.min(entries.len()))
            .min_by_key(|(_, entry)| entry.last_access_secs())
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub(super) fn contains(&self, key: &BorrowedFingerprint<'_>, now: Instant) -> bool {
        let entries = self.entries.read().unwrap();
        entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// Drop every expired entry; returns how many were removed.
    pub(super) fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}
