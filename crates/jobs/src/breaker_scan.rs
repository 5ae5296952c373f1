use meridian_dns_infrastructure::dns::load_balancer::LoadBalancer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Promotes cooled-down open breakers to half-open between queries, so an
/// idle upstream gets its probe chance without waiting for traffic.
pub struct BreakerScanJob {
    balancer: Arc<LoadBalancer>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl BreakerScanJob {
    pub fn new(balancer: Arc<LoadBalancer>, shutdown: CancellationToken) -> Self {
        Self {
            balancer,
            interval_secs: 1,
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
                        info!("breaker scan shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.balancer.maintain_breakers(Instant::now());
                    }
                }
            }
        });
    }
}
