use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

static COARSE_CLOCK: LazyLock<AtomicU64> = LazyLock::new(|| AtomicU64::new(now_secs()));

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Coarse current time in seconds since the UNIX epoch.
///
/// A relaxed atomic load instead of a `SystemTime::now()` syscall; good
/// enough for last-access stamps used by sampled eviction.
#[inline]
pub fn coarse_now_secs() -> u64 {
    COARSE_CLOCK.load(Ordering::Relaxed)
}

/// Advance the coarse clock; called from the compaction job tick.
pub fn tick() {
    COARSE_CLOCK.store(now_secs(), Ordering::Relaxed);
}
