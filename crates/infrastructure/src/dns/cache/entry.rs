use super::coarse_clock;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// One cached response.
///
/// Holds a complete well-formed DNS response ready to copy onto the wire
/// after the id field is rewritten. Entries are shared between tiers via
/// `Arc`; promotion inserts the same entry into a higher tier.
#[derive(Debug)]
pub struct CacheEntry {
    response: Bytes,
    expires_at: Instant,
    inserted_at: Instant,
    hits: AtomicU64,
    last_access_secs: AtomicU64,
}

impl CacheEntry {
    pub fn new(response: Bytes, ttl_secs: u32, now: Instant) -> Self {
        Self {
            response,
            expires_at: now + std::time::Duration::from_secs(u64::from(ttl_secs)),
            inserted_at: now,
            hits: AtomicU64::new(0),
            last_access_secs: AtomicU64::new(coarse_clock::coarse_now_secs()),
        }
    }

    pub fn response(&self) -> &Bytes {
        &self.response
    }

    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before expiry.
    pub fn remaining_ttl_secs(&self, now: Instant) -> u64 {
        self.expires_at.saturating_duration_since(now).as_secs()
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.last_access_secs
            .store(coarse_clock::coarse_now_secs(), Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Coarse-clock stamp of the most recent access; eviction sampling
    /// prefers the oldest.
    pub fn last_access_secs(&self) -> u64 {
        self.last_access_secs.load(Ordering::Relaxed)
    }
}
