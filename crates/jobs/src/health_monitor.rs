use meridian_dns_infrastructure::dns::load_balancer::LoadBalancer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Re-evaluates upstream health on a fixed schedule into the balancer's
/// shared health map.
pub struct HealthMonitorJob {
    balancer: Arc<LoadBalancer>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl HealthMonitorJob {
    pub fn new(balancer: Arc<LoadBalancer>, shutdown: CancellationToken) -> Self {
        Self {
            balancer,
            interval_secs: 5,
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
                        info!("health monitor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.balancer.evaluate_health();
                        let unhealthy = self
                            .balancer
                            .health()
                            .snapshot()
                            .iter()
                            .filter(|(_, status)| !status.healthy)
                            .count();
                        if unhealthy > 0 {
                            debug!(unhealthy, "health evaluation complete");
                        }
                    }
                }
            }
        });
    }
}
