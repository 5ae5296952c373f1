use super::upstream::{UpstreamServer, UpstreamStats};
use meridian_dns_domain::{GeoPoint, SelectionStrategy};

/// Distance at which geographic affinity bottoms out.
const MAX_GEO_DISTANCE_KM: f64 = 20_000.0;

const WEIGHT_LATENCY: f64 = 0.25;
const WEIGHT_SUCCESS: f64 = 0.25;
const WEIGHT_LOAD: f64 = 0.20;
const WEIGHT_GEO: f64 = 0.15;
const WEIGHT_SPECIALIZATION: f64 = 0.10;
const WEIGHT_TIME: f64 = 0.05;

/// Per-request facts the selection strategies score against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryPriority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    pub qtype: u16,
    pub client_location: Option<GeoPoint>,
    pub recursion_desired: bool,
    pub priority: QueryPriority,
}

impl QueryContext {
    pub fn new(qtype: u16) -> Self {
        Self {
            qtype,
            client_location: None,
            recursion_desired: true,
            priority: QueryPriority::default(),
        }
    }

    pub fn with_client_location(mut self, location: GeoPoint) -> Self {
        self.client_location = Some(location);
        self
    }

    pub fn with_recursion_desired(mut self, rd: bool) -> Self {
        self.recursion_desired = rd;
        self
    }

    pub fn with_priority(mut self, priority: QueryPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// One selectable upstream with its live stats.
#[derive(Clone, Copy)]
pub(super) struct Candidate<'a> {
    pub server: &'a UpstreamServer,
    pub stats: &'a UpstreamStats,
}

/// Pick the index of the winning candidate, or `None` when the slice is
/// empty. Ties break toward the earlier candidate (insertion order).
pub(super) fn select_index(
    strategy: SelectionStrategy,
    ctx: &QueryContext,
    candidates: &[Candidate<'_>],
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    match strategy {
        SelectionStrategy::Intelligent | SelectionStrategy::Adaptive => {
            argmax(candidates, |c| intelligent_score(c.server, c.stats, ctx))
        }
        SelectionStrategy::WeightedRoundRobin => roulette(candidates),
        SelectionStrategy::LeastLatency => {
            argmax(candidates, |c| -c.stats.avg_latency_ms())
        }
        SelectionStrategy::Geographic => {
            argmax(candidates, |c| geo_score(ctx.client_location, c.server.location))
        }
    }
}

fn argmax(candidates: &[Candidate<'_>], score: impl Fn(&Candidate<'_>) -> f64) -> Option<usize> {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (index, candidate) in candidates.iter().enumerate() {
        let s = score(candidate);
        if s > best_score {
            best = index;
            best_score = s;
        }
    }
    Some(best)
}

/// Cumulative-weight roulette over `weight * success_rate * 1/(1+latency)`.
fn roulette(candidates: &[Candidate<'_>]) -> Option<usize> {
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| {
            let dynamic =
                c.server.weight * c.stats.success_rate() / (1.0 + c.stats.avg_latency_ms());
            dynamic.max(0.0)
        })
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(0);
    }
    let mut spin = fastrand::f64() * total;
    for (index, weight) in weights.iter().enumerate() {
        spin -= weight;
        if spin <= 0.0 {
            return Some(index);
        }
    }
    Some(candidates.len() - 1)
}

/// Composite score of the default strategy. Pure in the upstream's current
/// stats and the query context.
pub fn intelligent_score(
    server: &UpstreamServer,
    stats: &UpstreamStats,
    ctx: &QueryContext,
) -> f64 {
    let latency_score = 1.0 - (stats.avg_latency_ms() / 1_000.0).clamp(0.0, 1.0);
    let success_score = stats.success_rate();
    let load_score = 1.0 - f64::from(stats.outstanding()) / f64::from(server.capacity);
    let geo = geo_score(ctx.client_location, server.location);
    let specialization = if server.specializations.contains(&ctx.qtype) {
        1.0
    } else {
        0.5
    };
    let time_score = 1.0;

    WEIGHT_LATENCY * latency_score
        + WEIGHT_SUCCESS * success_score
        + WEIGHT_LOAD * load_score
        + WEIGHT_GEO * geo
        + WEIGHT_SPECIALIZATION * specialization
        + WEIGHT_TIME * time_score
}

/// Proximity score normalised to a 20,000 km maximum; 0.5 when either
/// location is unknown.
pub fn geo_score(client: Option<GeoPoint>, upstream: Option<GeoPoint>) -> f64 {
    match (client, upstream) {
        (Some(client), Some(upstream)) => {
            1.0 - (client.distance_km(&upstream) / MAX_GEO_DISTANCE_KM).clamp(0.0, 1.0)
        }
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_dns_domain::{RecordType, UpstreamConfig};
    use std::time::Duration;

    use super::super::upstream::UpstreamId;

    fn server(id: usize, config: UpstreamConfig) -> UpstreamServer {
        UpstreamServer::from_config(UpstreamId(id), &config).unwrap()
    }

    #[test]
    fn intelligent_prefers_fast_successful_upstream() {
        let fast = server(0, UpstreamConfig::new("10.0.0.1", 53));
        let slow = server(1, UpstreamConfig::new("10.0.0.2", 53));
        let fast_stats = UpstreamStats::default();
        let slow_stats = UpstreamStats::default();
        fast_stats.record_success(Duration::from_millis(10));
        slow_stats.record_success(Duration::from_millis(800));

        let ctx = QueryContext::new(1);
        let candidates = [
            Candidate {
                server: &fast,
                stats: &fast_stats,
            },
            Candidate {
                server: &slow,
                stats: &slow_stats,
            },
        ];
        assert_eq!(
            select_index(SelectionStrategy::Intelligent, &ctx, &candidates),
            Some(0)
        );
    }

    #[test]
    fn intelligent_is_deterministic_for_fixed_stats() {
        let a = server(0, UpstreamConfig::new("10.0.0.1", 53));
        let b = server(1, UpstreamConfig::new("10.0.0.2", 53));
        let a_stats = UpstreamStats::default();
        let b_stats = UpstreamStats::default();
        a_stats.record_success(Duration::from_millis(50));
        b_stats.record_success(Duration::from_millis(100));

        let ctx = QueryContext::new(1);
        let candidates = [
            Candidate {
                server: &a,
                stats: &a_stats,
            },
            Candidate {
                server: &b,
                stats: &b_stats,
            },
        ];
        let first = select_index(SelectionStrategy::Intelligent, &ctx, &candidates);
        for _ in 0..10 {
            assert_eq!(
                select_index(SelectionStrategy::Intelligent, &ctx, &candidates),
                first
            );
        }
    }

    #[test]
    fn specialization_breaks_otherwise_equal_upstreams() {
        let mut plain_config = UpstreamConfig::new("10.0.0.1", 53);
        plain_config.specializations = vec![];
        let mut special_config = UpstreamConfig::new("10.0.0.2", 53);
        special_config.specializations = vec![RecordType::AAAA];

        let plain = server(0, plain_config);
        let special = server(1, special_config);
        let plain_stats = UpstreamStats::default();
        let special_stats = UpstreamStats::default();

        let ctx = QueryContext::new(RecordType::AAAA.qtype());
        let candidates = [
            Candidate {
                server: &plain,
                stats: &plain_stats,
            },
            Candidate {
                server: &special,
                stats: &special_stats,
            },
        ];
        assert_eq!(
            select_index(SelectionStrategy::Intelligent, &ctx, &candidates),
            Some(1)
        );
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let a = server(0, UpstreamConfig::new("10.0.0.1", 53));
        let b = server(1, UpstreamConfig::new("10.0.0.2", 53));
        let a_stats = UpstreamStats::default();
        let b_stats = UpstreamStats::default();
        let ctx = QueryContext::new(1);
        let candidates = [
            Candidate {
                server: &a,
                stats: &a_stats,
            },
            Candidate {
                server: &b,
                stats: &b_stats,
            },
        ];
        assert_eq!(
            select_index(SelectionStrategy::Intelligent, &ctx, &candidates),
            Some(0)
        );
    }

    #[test]
    fn least_latency_picks_lowest_average() {
        let a = server(0, UpstreamConfig::new("10.0.0.1", 53));
        let b = server(1, UpstreamConfig::new("10.0.0.2", 53));
        let a_stats = UpstreamStats::default();
        let b_stats = UpstreamStats::default();
        a_stats.record_success(Duration::from_millis(200));
        b_stats.record_success(Duration::from_millis(20));
        let ctx = QueryContext::new(1);
        let candidates = [
            Candidate {
                server: &a,
                stats: &a_stats,
            },
            Candidate {
                server: &b,
                stats: &b_stats,
            },
        ];
        assert_eq!(
            select_index(SelectionStrategy::LeastLatency, &ctx, &candidates),
            Some(1)
        );
    }

    #[test]
    fn geographic_picks_nearest() {
        let mut near_config = UpstreamConfig::new("10.0.0.1", 53);
        near_config.location = Some(GeoPoint::new(52.5, 13.4));
        let mut far_config = UpstreamConfig::new("10.0.0.2", 53);
        far_config.location = Some(GeoPoint::new(-33.9, 151.2));

        let near = server(0, near_config);
        let far = server(1, far_config);
        let near_stats = UpstreamStats::default();
        let far_stats = UpstreamStats::default();

        let ctx = QueryContext::new(1).with_client_location(GeoPoint::new(52.52, 13.405));
        let candidates = [
            Candidate {
                server: &far,
                stats: &far_stats,
            },
            Candidate {
                server: &near,
                stats: &near_stats,
            },
        ];
        assert_eq!(
            select_index(SelectionStrategy::Geographic, &ctx, &candidates),
            Some(1)
        );
    }

    #[test]
    fn geo_score_without_location_is_half() {
        assert_eq!(geo_score(None, Some(GeoPoint::new(0.0, 0.0))), 0.5);
        assert_eq!(geo_score(Some(GeoPoint::new(0.0, 0.0)), None), 0.5);
    }

    #[test]
    fn weighted_round_robin_always_returns_a_candidate() {
        let a = server(0, UpstreamConfig::new("10.0.0.1", 53));
        let b = server(1, UpstreamConfig::new("10.0.0.2", 53));
        let a_stats = UpstreamStats::default();
        let b_stats = UpstreamStats::default();
        let ctx = QueryContext::new(1);
        let candidates = [
            Candidate {
                server: &a,
                stats: &a_stats,
            },
            Candidate {
                server: &b,
                stats: &b_stats,
            },
        ];
        for _ in 0..50 {
            let picked =
                select_index(SelectionStrategy::WeightedRoundRobin, &ctx, &candidates).unwrap();
            assert!(picked < 2);
        }
    }
}
