use super::key::BorrowedFingerprint;
use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHasher};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Instant;

/// One-hour observation window.
const WINDOW_SECS: u64 = 3_600;

/// Below this many observations the tracker reports `Normal`.
const MIN_SAMPLES: u64 = 4;

/// Observed query rate bucket for a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFrequency {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy)]
struct QueryWindow {
    count: u64,
    window_start: Instant,
}

/// Bounded per-fingerprint query-rate tracker.
///
/// Keys are 64-bit fingerprint hashes rather than owned fingerprints, so
/// recording an access allocates nothing; occasional hash collisions only
/// perturb a TTL heuristic. The LRU bound keeps memory fixed.
pub struct FrequencyTracker {
    windows: Mutex<LruCache<u64, QueryWindow, FxBuildHasher>>,
}

impl FrequencyTracker {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            windows: Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)),
        }
    }

    fn key(fingerprint: &BorrowedFingerprint<'_>) -> u64 {
        let mut hasher = FxHasher::default();
        fingerprint.hash(&mut hasher);
        hasher.finish()
    }

    /// Record one query for `fingerprint` at `now`.
    pub fn record(&self, fingerprint: &BorrowedFingerprint<'_>, now: Instant) {
        let key = Self::key(fingerprint);
        let mut windows = self.windows.lock().unwrap();
        let bumped = match windows.get_mut(&key) {
            Some(window)
                if now.saturating_duration_since(window.window_start).as_secs()
                    < WINDOW_SECS =>
            {
                window.count += 1;
                true
            }
            _ => false,
        };
        if !bumped {
            windows.put(
                key,
                QueryWindow {
                    count: 1,
                    window_start: now,
                },
            );
        }
    }

    /// Classify the observed rate for `fingerprint`.
    ///
    /// Unknown fingerprints and fingerprints with fewer than
    /// `MIN_SAMPLES` observations are `Normal`. Within the first hour of
    /// a window the count itself approximates the hourly rate; past that
    /// the rate decays with elapsed time, so an abandoned window drifts
    /// down through `Low` into `VeryLow`.
    pub fn classify(&self, fingerprint: &BorrowedFingerprint<'_>, now: Instant) -> QueryFrequency {
        let key = Self::key(fingerprint);
        let mut windows = self.windows.lock().unwrap();
        let Some(window) = windows.get(&key) else {
            return QueryFrequency::Normal;
        };
        if window.count < MIN_SAMPLES {
            return QueryFrequency::Normal;
        }

        let elapsed = now
            .saturating_duration_since(window.window_start)
            .as_secs()
            .max(WINDOW_SECS);
        let per_hour = window.count * WINDOW_SECS / elapsed;

        match per_hour {
            240.. => QueryFrequency::VeryHigh,
            60..=239 => QueryFrequency::High,
            12..=59 => QueryFrequency::Normal,
            2..=11 => QueryFrequency::Low,
            _ => QueryFrequency::VeryLow,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fp(name: &'static str) -> BorrowedFingerprint<'static> {
        BorrowedFingerprint::new(name, 1, 1)
    }

    #[test]
    fn unknown_fingerprint_is_normal() {
        let tracker = FrequencyTracker::new(16);
        assert_eq!(
            tracker.classify(&fp("example.com"), Instant::now()),
            QueryFrequency::Normal
        );
    }

    #[test]
    fn few_samples_stay_normal() {
        let tracker = FrequencyTracker::new(16);
        let now = Instant::now();
        for _ in 0..3 {
            tracker.record(&fp("example.com"), now);
        }
        assert_eq!(
            tracker.classify(&fp("example.com"), now),
            QueryFrequency::Normal
        );
    }

    #[test]
    fn heavy_traffic_classifies_very_high() {
        let tracker = FrequencyTracker::new(16);
        let now = Instant::now();
        for _ in 0..300 {
            tracker.record(&fp("popular.test"), now);
        }
        assert_eq!(
            tracker.classify(&fp("popular.test"), now),
            QueryFrequency::VeryHigh
        );
    }

    #[test]
    fn moderate_traffic_classifies_high() {
        let tracker = FrequencyTracker::new(16);
        let now = Instant::now();
        for _ in 0..100 {
            tracker.record(&fp("busy.test"), now);
        }
        assert_eq!(
            tracker.classify(&fp("busy.test"), now),
            QueryFrequency::High
        );
    }

    #[test]
    fn stale_window_decays_to_very_low() {
        let tracker = FrequencyTracker::new(16);
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record(&fp("stale.test"), start);
        }
        let later = start + Duration::from_secs(3 * WINDOW_SECS);
        assert_eq!(
            tracker.classify(&fp("stale.test"), later),
            QueryFrequency::VeryLow
        );
    }

    #[test]
    fn capacity_is_bounded() {
        let tracker = FrequencyTracker::new(8);
        let now = Instant::now();
        let names: Vec<String> = (0..32).map(|i| format!("host{i}.test")).collect();
        for name in &names {
            tracker.record(&BorrowedFingerprint::new(name, 1, 1), now);
        }
        assert!(tracker.len() <= 8);
    }
}
