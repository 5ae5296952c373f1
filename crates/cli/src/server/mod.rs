use meridian_dns_domain::{Config, ResolverError};
use meridian_dns_infrastructure::dns::alt_naming::{AltNamingRegistry, NamingScheme};
use meridian_dns_infrastructure::dns::block_filter::BlockFilter;
use meridian_dns_infrastructure::dns::cache::TieredCache;
use meridian_dns_infrastructure::dns::events::TracingEventSink;
use meridian_dns_infrastructure::dns::load_balancer::{HealthMonitor, LoadBalancer};
use meridian_dns_infrastructure::dns::server::{QueryPipeline, UdpServer};
use meridian_dns_infrastructure::dns::transport::UdpTransport;
use meridian_dns_jobs::{BreakerScanJob, CacheCompactionJob, HealthMonitorJob, JobRunner};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Wire the resolver together and run it until `shutdown` fires.
pub async fn start(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    info!(
        upstreams = config.upstreams.len(),
        strategy = ?config.strategy,
        blocklist_patterns = config.blocking.patterns.len(),
        "starting resolver"
    );

    let cache = Arc::new(TieredCache::new(&config.cache));
    let block_filter = Arc::new(BlockFilter::from_config(&config.blocking));
    let alt_naming = Arc::new(build_alt_naming(&config));
    let health = Arc::new(HealthMonitor::new());

    let balancer = Arc::new(LoadBalancer::new(
        &config.upstreams,
        config.strategy,
        config.max_retries,
        config.timeout_initial_ms,
        Arc::clone(&health),
        Arc::new(UdpTransport::new()),
    )?);

    let pipeline = Arc::new(QueryPipeline::new(
        Arc::clone(&cache),
        block_filter,
        alt_naming,
        Arc::clone(&balancer),
        Arc::new(TracingEventSink),
        &config.cache,
    ));

    JobRunner::new()
        .with_health_monitor(
            HealthMonitorJob::new(Arc::clone(&balancer), shutdown.clone())
                .with_interval(config.health.interval_secs),
        )
        .with_breaker_scan(BreakerScanJob::new(Arc::clone(&balancer), shutdown.clone()))
        .with_cache_compaction(
            CacheCompactionJob::new(Arc::clone(&cache), shutdown.clone())
                .with_interval(config.cache.compaction_interval_secs),
        )
        .start();

    let listen: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .map_err(|e| {
            ResolverError::InvalidConfig(format!("invalid listen address: {e}"))
        })?;

    let server = UdpServer::bind(listen, pipeline).await?;
    info!(addr = %server.local_addr(), "resolver ready");

    server.run(shutdown).await?;
    Ok(())
}

/// Alternative-naming resolvers are supplied by embedders; the stock
/// binary only reports what the configuration asked for.
fn build_alt_naming(config: &Config) -> AltNamingRegistry {
    let registry = AltNamingRegistry::new();
    for (key, endpoint) in &config.alt_naming.endpoints {
        match NamingScheme::from_key(key) {
            Some(scheme) => warn!(
                scheme = %scheme,
                endpoint = %endpoint,
                "no resolver implementation compiled in for scheme; its names will answer NXDOMAIN"
            ),
            None => warn!(scheme = %key, "unknown alternative-naming scheme in configuration"),
        }
    }
    registry
}
