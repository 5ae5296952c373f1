use meridian_dns_infrastructure::dns::cache::{coarse_clock, TieredCache};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodic expired-entry sweep. Also advances the coarse clock that
/// stamps cache-entry last-access times.
pub struct CacheCompactionJob {
    cache: Arc<TieredCache>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl CacheCompactionJob {
    pub fn new(cache: Arc<TieredCache>, shutdown: CancellationToken) -> Self {
        Self {
            cache,
            interval_secs: 30,
            shutdown,
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs.max(1);
        self
    }

    pub fn start(self) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("cache compaction shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        coarse_clock::tick();
                        let removed = self.cache.compact(Instant::now());
                        if removed > 0 {
                            debug!(removed, entries = self.cache.len(), "expired entries swept");
                        }
                    }
                }
            }
        });
    }
}
