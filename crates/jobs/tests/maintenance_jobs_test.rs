use bytes::Bytes;
use meridian_dns_domain::{CacheConfig, SelectionStrategy, UpstreamConfig};
use meridian_dns_infrastructure::dns::cache::{Fingerprint, TieredCache, TierKind};
use meridian_dns_infrastructure::dns::load_balancer::{HealthMonitor, LoadBalancer};
use meridian_dns_infrastructure::dns::transport::UdpTransport;
use meridian_dns_jobs::{CacheCompactionJob, HealthMonitorJob, JobRunner};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn compaction_job_sweeps_expired_entries() {
    let cache = Arc::new(TieredCache::new(&CacheConfig::default()));
    let now = Instant::now();
    cache.insert_into(
        TierKind::Warm,
        Fingerprint::new("short.test", 1, 1),
        Bytes::from_static(&[0u8; 16]),
        1,
        now,
    );
    cache.insert_into(
        TierKind::Cold,
        Fingerprint::new("long.test", 1, 1),
        Bytes::from_static(&[0u8; 16]),
        600,
        now,
    );
    assert_eq!(cache.len(), 2);

    let shutdown = CancellationToken::new();
    CacheCompactionJob::new(Arc::clone(&cache), shutdown.clone())
        .with_interval(1)
        .start();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    shutdown.cancel();

    assert_eq!(cache.len(), 1, "expired entry swept, fresh one kept");
}

#[tokio::test]
async fn health_monitor_job_populates_the_shared_map() {
    let health = Arc::new(HealthMonitor::new());
    let balancer = Arc::new(
        LoadBalancer::new(
            &[
                UpstreamConfig::new("192.0.2.1", 53),
                UpstreamConfig::new("192.0.2.2", 53),
            ],
            SelectionStrategy::Intelligent,
            2,
            5_000,
            Arc::clone(&health),
            Arc::new(UdpTransport::new()),
        )
        .unwrap(),
    );

    assert!(health.snapshot().is_empty());

    let shutdown = CancellationToken::new();
    JobRunner::new()
        .with_health_monitor(HealthMonitorJob::new(balancer, shutdown.clone()).with_interval(1))
        .start();

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.cancel();

    let snapshot = health.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|(_, status)| status.healthy));
}
