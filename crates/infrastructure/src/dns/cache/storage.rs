use super::entry::CacheEntry;
use super::frequency::{FrequencyTracker, QueryFrequency};
use super::key::{BorrowedFingerprint, Fingerprint};
use super::metrics::CacheMetrics;
use super::tier::{Tier, TierLookup};
use bytes::Bytes;
use meridian_dns_domain::CacheConfig;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Day cap for very frequently queried names.
const TTL_CAP_VERY_HIGH: u32 = 86_400;
const TTL_CAP_HIGH: u32 = 43_200;
const TTL_FLOOR_LOW: u32 = 300;
const TTL_FLOOR_VERY_LOW: u32 = 60;

/// The three cache tiers, ordered hottest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Hot,
    Warm,
    Cold,
}

/// Three-tier response cache.
///
/// Lookup searches hot, then warm, then cold; the first fresh hit wins and
/// is copied one tier up (best-effort, skipped under lock contention).
/// Expired entries are removed from whichever tier they are found in and
/// the search continues. Insertion lands in the tier predicted from the
/// fingerprint's observed query rate, defaulting to warm.
pub struct TieredCache {
    hot: Tier,
    warm: Tier,
    cold: Tier,
    frequency: FrequencyTracker,
    metrics: CacheMetrics,
}

impl TieredCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            hot: Tier::new("hot", config.hot_capacity),
            warm: Tier::new("warm", config.warm_capacity),
            cold: Tier::new("cold", config.cold_capacity),
            frequency: FrequencyTracker::new(config.cold_capacity),
            metrics: CacheMetrics::default(),
        }
    }

    /// Look up a response. The returned entry is fresh: it has strictly
    /// positive remaining TTL at the instant of return.
    pub fn get(
        &self,
        key: &BorrowedFingerprint<'_>,
        now: Instant,
    ) -> Option<Arc<CacheEntry>> {
        self.frequency.record(key, now);

        for (index, tier) in [&self.hot, &self.warm, &self.cold].into_iter().enumerate() {
            match tier.get(key, now) {
                TierLookup::Hit(entry) => {
                    entry.record_hit();
                    self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                    self.promote(index, key, &entry);
                    return Some(entry);
                }
                TierLookup::Expired => {
                    self.metrics.expired_removals.fetch_add(1, Ordering::Relaxed);
                }
                TierLookup::Miss => {}
            }
        }

        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Copy a warm hit into hot, a cold hit into warm. The source tier
    /// keeps its entry.
    fn promote(&self, hit_index: usize, key: &BorrowedFingerprint<'_>, entry: &Arc<CacheEntry>) {
        let target = match hit_index {
            1 => &self.hot,
            2 => &self.warm,
            _ => return,
        };
        if target.try_insert(BorrowedFingerprint::to_owned(*key), Arc::clone(entry)) {
            self.metrics.promotions.fetch_add(1, Ordering::Relaxed);
            debug!(name = key.name, tier = target.name(), "cache entry promoted");
        }
    }

    /// Insert a response under `key` with the given TTL.
    pub fn put(&self, key: Fingerprint, response: Bytes, ttl_secs: u32, now: Instant) {
        let tier = self.predicted_tier(&key, now);
        let entry = Arc::new(CacheEntry::new(response, ttl_secs, now));
        let evicted = tier.insert(key, entry);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Place an entry directly into a tier, bypassing prediction.
    pub fn insert_into(
        &self,
        tier: TierKind,
        key: Fingerprint,
        response: Bytes,
        ttl_secs: u32,
        now: Instant,
    ) {
        let entry = Arc::new(CacheEntry::new(response, ttl_secs, now));
        let evicted = self.tier(tier).insert(key, entry);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn predicted_tier(&self, key: &Fingerprint, now: Instant) -> &Tier {
        let borrowed = BorrowedFingerprint::new(&key.name, key.qtype, key.qclass);
        match self.frequency.classify(&borrowed, now) {
            QueryFrequency::VeryHigh | QueryFrequency::High => &self.hot,
            QueryFrequency::Normal => &self.warm,
            QueryFrequency::Low | QueryFrequency::VeryLow => &self.cold,
        }
    }

    /// Scale a base TTL by the observed query rate for `key`.
    pub fn adjust_ttl(&self, key: &BorrowedFingerprint<'_>, base_ttl: u32, now: Instant) -> u32 {
        match self.frequency.classify(key, now) {
            QueryFrequency::VeryHigh => base_ttl.saturating_mul(2).min(TTL_CAP_VERY_HIGH),
            QueryFrequency::High => base_ttl.saturating_add(1_800).min(TTL_CAP_HIGH),
            QueryFrequency::Normal => base_ttl,
            QueryFrequency::Low => (base_ttl / 2).max(TTL_FLOOR_LOW),
            QueryFrequency::VeryLow => (base_ttl / 4).max(TTL_FLOOR_VERY_LOW),
        }
    }

    /// Sweep expired entries from all tiers.
    pub fn compact(&self, now: Instant) -> usize {
        let removed = self.hot.purge_expired(now)
            + self.warm.purge_expired(now)
            + self.cold.purge_expired(now);
        if removed > 0 {
            self.metrics
                .expired_removals
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    pub fn contains_in(&self, tier: TierKind, key: &BorrowedFingerprint<'_>, now: Instant) -> bool {
        self.tier(tier).contains(key, now)
    }

    pub fn tier_len(&self, tier: TierKind) -> usize {
        self.tier(tier).len()
    }

    pub fn len(&self) -> usize {
        self.hot.len() + self.warm.len() + self.cold.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn tier(&self, kind: TierKind) -> &Tier {
        match kind {
            TierKind::Hot => &self.hot,
            TierKind::Warm => &self.warm,
            TierKind::Cold => &self.cold,
        }
    }
}
