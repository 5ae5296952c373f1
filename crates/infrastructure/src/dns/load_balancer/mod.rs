//! Upstream pool: strategy-driven selection with health filtering, per
//! upstream circuit breaking, adaptive timeouts and automatic failover.

mod breaker;
mod health;
mod strategy;
mod timeout;
mod upstream;

pub use breaker::{BreakerState, CircuitBreaker};
pub use health::{HealthMonitor, HealthStatus};
pub use strategy::{geo_score, intelligent_score, QueryContext, QueryPriority};
pub use timeout::AdaptiveTimeout;
pub use upstream::{UpstreamId, UpstreamServer, UpstreamStats};

use crate::dns::transport::DnsTransport;
use crate::dns::wire::HEADER_LEN;
use bytes::Bytes;
use meridian_dns_domain::{ResolverError, SelectionStrategy, UpstreamConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use strategy::Candidate;
use tracing::{debug, warn};

/// Successful upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamResult {
    pub response: Bytes,
    pub server: SocketAddr,
    pub latency_ms: u64,
}

/// Point-in-time view of one upstream, for logging and introspection.
#[derive(Debug, Clone)]
pub struct UpstreamSnapshot {
    pub id: UpstreamId,
    pub addr: SocketAddr,
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub avg_latency_ms: f64,
    pub outstanding: u32,
    pub breaker: BreakerState,
    pub timeout_ms: u64,
}

/// The upstream load balancer.
///
/// Per-upstream state lives in flat arrays indexed by [`UpstreamId`]; the
/// components hold no references to each other.
pub struct LoadBalancer {
    upstreams: Vec<UpstreamServer>,
    stats: Vec<UpstreamStats>,
    breakers: Vec<CircuitBreaker>,
    timeouts: Vec<AdaptiveTimeout>,
    health: Arc<HealthMonitor>,
    transport: Arc<dyn DnsTransport>,
    strategy: SelectionStrategy,
    max_retries: usize,
}

impl LoadBalancer {
    pub fn new(
        configs: &[UpstreamConfig],
        strategy: SelectionStrategy,
        max_retries: usize,
        timeout_initial_ms: u64,
        health: Arc<HealthMonitor>,
        transport: Arc<dyn DnsTransport>,
    ) -> Result<Self, ResolverError> {
        if configs.is_empty() {
            return Err(ResolverError::InvalidConfig(
                "at least one upstream must be configured".into(),
            ));
        }
        let upstreams = configs
            .iter()
            .enumerate()
            .map(|(index, config)| UpstreamServer::from_config(UpstreamId(index), config))
            .collect::<Result<Vec<_>, _>>()?;
        let count = upstreams.len();
        Ok(Self {
            upstreams,
            stats: (0..count).map(|_| UpstreamStats::default()).collect(),
            breakers: (0..count).map(|_| CircuitBreaker::new()).collect(),
            timeouts: (0..count)
                .map(|_| AdaptiveTimeout::with_initial(timeout_initial_ms))
                .collect(),
            health,
            transport,
            strategy,
            max_retries: max_retries.max(1),
        })
    }

    /// Pick the best available upstream for this query.
    pub fn select(&self, ctx: &QueryContext, now: Instant) -> Result<&UpstreamServer, ResolverError> {
        self.select_excluding(ctx, &[], now)
    }

    /// Strategy selection over healthy candidates, skipping excluded ids,
    /// with the circuit breaker applied after each pick: an open breaker
    /// drops the winner and the strategy re-runs over the remainder.
    fn select_excluding(
        &self,
        ctx: &QueryContext,
        excluded: &[bool],
        now: Instant,
    ) -> Result<&UpstreamServer, ResolverError> {
        let mut candidates: Vec<Candidate<'_>> = self
            .upstreams
            .iter()
            .filter(|server| !excluded.get(server.id.0).copied().unwrap_or(false))
            .filter(|server| self.health.is_healthy(server.id))
            .map(|server| Candidate {
                server,
                stats: &self.stats[server.id.0],
            })
            .collect();

        while !candidates.is_empty() {
            let index = strategy::select_index(self.strategy, ctx, &candidates)
                .expect("non-empty candidate set");
            let picked = candidates[index].server;
            if self.breakers[picked.id.0].allow_request(now) {
                return Ok(picked);
            }
            debug!(upstream = %picked.addr, "breaker open, trying next candidate");
            candidates.swap_remove(index);
        }
        Err(ResolverError::NoHealthyUpstream)
    }

    /// Forward `query` with failover: up to `min(max_retries, upstreams)`
    /// attempts, a different upstream each time.
    pub async fn execute(
        &self,
        query: &[u8],
        ctx: &QueryContext,
    ) -> Result<UpstreamResult, ResolverError> {
        let attempts = self.max_retries.min(self.upstreams.len());
        let mut excluded = vec![false; self.upstreams.len()];

        for attempt in 0..attempts {
            let server = match self.select_excluding(ctx, &excluded, Instant::now()) {
                Ok(server) => server,
                Err(e) if attempt == 0 => return Err(e),
                Err(_) => break,
            };
            let id = server.id.0;
            excluded[id] = true;

            let timeout = self.timeouts[id].current();
            let started = Instant::now();
            let outcome = {
                let _in_flight = self.stats[id].begin_request();
                self.transport.send(server.addr, query, timeout).await
            };
            let elapsed = started.elapsed();
            let finished = Instant::now();

            match outcome {
                Ok(response) if Self::is_plausible_response(query, &response) => {
                    self.stats[id].record_success(elapsed);
                    self.breakers[id].record_success(finished);
                    self.timeouts[id].on_success(elapsed);
                    return Ok(UpstreamResult {
                        response,
                        server: server.addr,
                        latency_ms: elapsed.as_millis() as u64,
                    });
                }
                Ok(_) => {
                    self.stats[id].record_failure(elapsed);
                    self.breakers[id].record_failure(finished);
                    self.timeouts[id].on_failure(elapsed);
                    warn!(upstream = %server.addr, attempt, "implausible upstream response");
                }
                Err(e) => {
                    self.stats[id].record_failure(elapsed);
                    self.breakers[id].record_failure(finished);
                    self.timeouts[id].on_failure(elapsed);
                    warn!(upstream = %server.addr, attempt, error = %e, "upstream attempt failed");
                }
            }
        }

        Err(ResolverError::AllUpstreamsFailed)
    }

    /// A response must carry a full header and echo the query id.
    fn is_plausible_response(query: &[u8], response: &[u8]) -> bool {
        response.len() >= HEADER_LEN && query.len() >= 2 && response[..2] == query[..2]
    }

    /// Re-evaluate upstream health; driven by the monitor job.
    pub fn evaluate_health(&self) {
        self.health.evaluate(&self.upstreams, &self.stats);
    }

    /// Promote cooled-down breakers to half-open; driven by the scan job.
    pub fn maintain_breakers(&self, now: Instant) {
        for breaker in &self.breakers {
            breaker.maintain(now);
        }
    }

    pub fn upstream_count(&self) -> usize {
        self.upstreams.len()
    }

    pub fn breaker_state(&self, id: UpstreamId) -> Option<BreakerState> {
        self.breakers.get(id.0).map(|b| b.state())
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn snapshots(&self) -> Vec<UpstreamSnapshot> {
        self.upstreams
            .iter()
            .map(|server| {
                let id = server.id.0;
                UpstreamSnapshot {
                    id: server.id,
                    addr: server.addr,
                    total_queries: self.stats[id].total_queries(),
                    successful_queries: self.stats[id].successful_queries(),
                    failed_queries: self.stats[id].failed_queries(),
                    avg_latency_ms: self.stats[id].avg_latency_ms(),
                    outstanding: self.stats[id].outstanding(),
                    breaker: self.breakers[id].state(),
                    timeout_ms: self.timeouts[id].current_ms(),
                }
            })
            .collect()
    }
}
