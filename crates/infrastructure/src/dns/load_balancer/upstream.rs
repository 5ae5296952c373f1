use meridian_dns_domain::{GeoPoint, ResolverError, UpstreamConfig};
use rustc_hash::FxHashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Stable index of an upstream within the balancer's flat arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpstreamId(pub usize);

/// Static description of one forwarding target.
#[derive(Debug, Clone)]
pub struct UpstreamServer {
    pub id: UpstreamId,
    pub addr: SocketAddr,
    pub weight: f64,
    pub capacity: u32,
    pub location: Option<GeoPoint>,
    pub specializations: FxHashSet<u16>,
}

impl UpstreamServer {
    pub fn from_config(id: UpstreamId, config: &UpstreamConfig) -> Result<Self, ResolverError> {
        let ip: IpAddr = config
            .address
            .parse::<std::net::Ipv4Addr>()
            .map_err(|_| {
                ResolverError::InvalidConfig(format!(
                    "upstream address '{}' is not an IPv4 address",
                    config.address
                ))
            })?
            .into();
        Ok(Self {
            id,
            addr: SocketAddr::new(ip, config.port),
            weight: config.weight,
            capacity: config.capacity.max(1),
            location: config.location,
            specializations: config.specializations.iter().map(|rt| rt.qtype()).collect(),
        })
    }
}

/// Rolling per-upstream counters, mutated from any worker task.
///
/// The latency moving average halves on every sample:
/// `avg := (avg + sample) / 2`. Failed attempts contribute samples too.
#[derive(Debug, Default)]
pub struct UpstreamStats {
    total_queries: AtomicU64,
    successful_queries: AtomicU64,
    failed_queries: AtomicU64,
    /// Moving-average latency in microseconds; zero means no sample yet.
    avg_latency_micros: AtomicU64,
    outstanding: AtomicU32,
}

impl UpstreamStats {
    pub fn record_success(&self, latency: Duration) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.successful_queries.fetch_add(1, Ordering::Relaxed);
        self.fold_latency(latency);
    }

    pub fn record_failure(&self, latency: Duration) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.failed_queries.fetch_add(1, Ordering::Relaxed);
        self.fold_latency(latency);
    }

    fn fold_latency(&self, latency: Duration) {
        let sample = (latency.as_micros() as u64).max(1);
        self.avg_latency_micros
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |avg| {
                Some(if avg == 0 { sample } else { (avg + sample) / 2 })
            })
            .ok();
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries.load(Ordering::Relaxed)
    }

    pub fn successful_queries(&self) -> u64 {
        self.successful_queries.load(Ordering::Relaxed)
    }

    pub fn failed_queries(&self) -> u64 {
        self.failed_queries.load(Ordering::Relaxed)
    }

    /// Fraction of completed queries that succeeded; 1.0 before any data.
    pub fn success_rate(&self) -> f64 {
        let total = self.total_queries();
        if total == 0 {
            return 1.0;
        }
        self.successful_queries() as f64 / total as f64
    }

    pub fn avg_latency_ms(&self) -> f64 {
        self.avg_latency_micros.load(Ordering::Relaxed) as f64 / 1_000.0
    }

    pub fn outstanding(&self) -> u32 {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// RAII in-flight marker; decrements on drop.
    pub fn begin_request(&self) -> InFlightGuard<'_> {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        InFlightGuard { stats: self }
    }
}

pub struct InFlightGuard<'a> {
    stats: &'a UpstreamStats,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.stats.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}
