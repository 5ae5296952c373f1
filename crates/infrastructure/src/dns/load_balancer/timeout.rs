use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_INITIAL_MS: u64 = 5_000;
const DECAY: f64 = 0.95;
const GROWTH: f64 = 1.2;

/// Per-upstream I/O deadline that decays on fast successes and grows on
/// slow failures, always staying within [1s, 30s].
#[derive(Debug)]
pub struct AdaptiveTimeout {
    current_ms: AtomicU64,
}

impl Default for AdaptiveTimeout {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveTimeout {
    pub fn new() -> Self {
        Self::with_initial(DEFAULT_INITIAL_MS)
    }

    /// Start from a custom initial value, clamped into the legal range.
    pub fn with_initial(initial_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(initial_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)),
        }
    }

    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::Relaxed))
    }

    pub fn current_ms(&self) -> u64 {
        self.current_ms.load(Ordering::Relaxed)
    }

    /// A success well under half the deadline decays it by 5%.
    pub fn on_success(&self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        self.current_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if elapsed_ms < current / 2 {
                    Some(((current as f64 * DECAY) as u64).max(MIN_TIMEOUT_MS))
                } else {
                    None
                }
            })
            .ok();
    }

    /// A failure that consumed the whole deadline grows it by 20%.
    pub fn on_failure(&self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        self.current_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if elapsed_ms >= current {
                    Some(((current as f64 * GROWTH) as u64).min(MAX_TIMEOUT_MS))
                } else {
                    None
                }
            })
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_five_seconds() {
        assert_eq!(AdaptiveTimeout::new().current_ms(), 5_000);
    }

    #[test]
    fn fast_success_decays() {
        let timeout = AdaptiveTimeout::new();
        timeout.on_success(Duration::from_millis(100));
        assert_eq!(timeout.current_ms(), 4_750);
    }

    #[test]
    fn slow_success_leaves_timeout_alone() {
        let timeout = AdaptiveTimeout::new();
        timeout.on_success(Duration::from_millis(4_000));
        assert_eq!(timeout.current_ms(), 5_000);
    }

    #[test]
    fn timeout_failure_grows() {
        let timeout = AdaptiveTimeout::new();
        timeout.on_failure(Duration::from_millis(5_000));
        assert_eq!(timeout.current_ms(), 6_000);
    }

    #[test]
    fn quick_failure_leaves_timeout_alone() {
        let timeout = AdaptiveTimeout::new();
        timeout.on_failure(Duration::from_millis(10));
        assert_eq!(timeout.current_ms(), 5_000);
    }

    #[test]
    fn bounds_hold_under_any_sequence() {
        let timeout = AdaptiveTimeout::new();
        for _ in 0..200 {
            timeout.on_failure(Duration::from_millis(60_000));
            assert!(timeout.current_ms() <= 30_000);
        }
        assert_eq!(timeout.current_ms(), 30_000);
        for _ in 0..400 {
            timeout.on_success(Duration::from_millis(1));
            assert!(timeout.current_ms() >= 1_000);
        }
        assert_eq!(timeout.current_ms(), 1_000);
    }

    #[test]
    fn initial_value_is_clamped() {
        assert_eq!(AdaptiveTimeout::with_initial(10).current_ms(), 1_000);
        assert_eq!(AdaptiveTimeout::with_initial(90_000).current_ms(), 30_000);
    }
}
