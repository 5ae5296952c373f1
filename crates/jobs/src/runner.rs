use crate::{BreakerScanJob, CacheCompactionJob, HealthMonitorJob};
use tracing::info;

/// Central orchestrator for the maintenance jobs.
///
/// Register what the deployment needs, then call `start()` once.
#[derive(Default)]
pub struct JobRunner {
    health_monitor: Option<HealthMonitorJob>,
    breaker_scan: Option<BreakerScanJob>,
    cache_compaction: Option<CacheCompactionJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_health_monitor(mut self, job: HealthMonitorJob) -> Self {
        self.health_monitor = Some(job);
        self
    }

    pub fn with_breaker_scan(mut self, job: BreakerScanJob) -> Self {
        self.breaker_scan = Some(job);
        self
    }

    pub fn with_cache_compaction(mut self, job: CacheCompactionJob) -> Self {
        self.cache_compaction = Some(job);
        self
    }

    /// Spawn every registered job.
    pub fn start(self) {
        info!("starting maintenance jobs");

        if let Some(job) = self.health_monitor {
            job.start();
        }
        if let Some(job) = self.breaker_scan {
            job.start();
        }
        if let Some(job) = self.cache_compaction {
            job.start();
        }
    }
}
