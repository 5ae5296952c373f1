use super::upstream::{UpstreamId, UpstreamServer, UpstreamStats};
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use tracing::debug;

const MIN_SUCCESS_RATE: f64 = 0.8;
const MAX_AVG_LATENCY_MS: f64 = 500.0;
const OUTSTANDING_FACTOR: f64 = 0.9;

/// Latest health evaluation for one upstream.
#[derive(Debug, Clone, Copy)]
pub struct HealthStatus {
    pub healthy: bool,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub outstanding: u32,
}

/// Shared health map: written by the 5-second monitor job, read by every
/// selection. Upstreams with no evaluation yet are treated as healthy.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    statuses: RwLock<FxHashMap<UpstreamId, HealthStatus>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_healthy(&self, id: UpstreamId) -> bool {
        self.statuses
            .read()
            .unwrap()
            .get(&id)
            .map_or(true, |status| status.healthy)
    }

    /// Re-evaluate every upstream and swap the results in under one brief
    /// write lock.
    pub fn evaluate(&self, upstreams: &[UpstreamServer], stats: &[UpstreamStats]) {
        let mut next = FxHashMap::default();
        for (server, stats) in upstreams.iter().zip(stats) {
            let status = HealthStatus {
                healthy: Self::is_healthy_now(server, stats),
                success_rate: stats.success_rate(),
                avg_latency_ms: stats.avg_latency_ms(),
                outstanding: stats.outstanding(),
            };
            if !status.healthy {
                debug!(
                    upstream = %server.addr,
                    success_rate = status.success_rate,
                    avg_latency_ms = status.avg_latency_ms,
                    outstanding = status.outstanding,
                    "upstream evaluated unhealthy"
                );
            }
            next.insert(server.id, status);
        }
        *self.statuses.write().unwrap() = next;
    }

    fn is_healthy_now(server: &UpstreamServer, stats: &UpstreamStats) -> bool {
        stats.success_rate() >= MIN_SUCCESS_RATE
            && stats.avg_latency_ms() <= MAX_AVG_LATENCY_MS
            && f64::from(stats.outstanding()) < OUTSTANDING_FACTOR * f64::from(server.capacity)
    }

    pub fn snapshot(&self) -> Vec<(UpstreamId, HealthStatus)> {
        let statuses = self.statuses.read().unwrap();
        let mut entries: Vec<_> = statuses.iter().map(|(id, s)| (*id, *s)).collect();
        entries.sort_by_key(|(id, _)| id.0);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_dns_domain::UpstreamConfig;
    use std::time::Duration;

    fn server(id: usize) -> UpstreamServer {
        UpstreamServer::from_config(UpstreamId(id), &UpstreamConfig::new("127.0.0.1", 53)).unwrap()
    }

    #[test]
    fn unevaluated_upstream_is_healthy() {
        let monitor = HealthMonitor::new();
        assert!(monitor.is_healthy(UpstreamId(0)));
    }

    #[test]
    fn failing_upstream_goes_unhealthy() {
        let monitor = HealthMonitor::new();
        let servers = vec![server(0)];
        let stats = vec![UpstreamStats::default()];
        for _ in 0..8 {
            stats[0].record_failure(Duration::from_millis(10));
        }
        for _ in 0..2 {
            stats[0].record_success(Duration::from_millis(10));
        }
        monitor.evaluate(&servers, &stats);
        assert!(!monitor.is_healthy(UpstreamId(0)));
    }

    #[test]
    fn slow_upstream_goes_unhealthy() {
        let monitor = HealthMonitor::new();
        let servers = vec![server(0)];
        let stats = vec![UpstreamStats::default()];
        for _ in 0..4 {
            stats[0].record_success(Duration::from_millis(900));
        }
        monitor.evaluate(&servers, &stats);
        assert!(!monitor.is_healthy(UpstreamId(0)));
    }

    #[test]
    fn recovery_flips_back_to_healthy() {
        let monitor = HealthMonitor::new();
        let servers = vec![server(0)];
        let stats = vec![UpstreamStats::default()];
        for _ in 0..50 {
            stats[0].record_success(Duration::from_millis(20));
        }
        monitor.evaluate(&servers, &stats);
        assert!(monitor.is_healthy(UpstreamId(0)));
    }
}
