use crate::geo::GeoPoint;
use crate::record_type::RecordType;
use serde::{Deserialize, Serialize};

/// How the load balancer picks among healthy upstreams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Composite score over latency, success rate, load, geography and
    /// per-qtype specialisation.
    #[default]
    Intelligent,
    /// Roulette over `weight * success_rate * 1/(1+latency)`.
    WeightedRoundRobin,
    /// Lowest moving-average latency wins.
    LeastLatency,
    /// Closest to the client wins.
    Geographic,
    /// Reserved alias of `Intelligent`.
    Adaptive,
}

/// One forwarding target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// IPv4 address of the upstream resolver.
    pub address: String,

    #[serde(default = "default_upstream_port")]
    pub port: u16,

    /// Static weight for weighted round-robin selection.
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Concurrent in-flight query capacity used for load scoring.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Geographic coordinates, if known.
    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// Record types this upstream is considered especially good at.
    #[serde(default)]
    pub specializations: Vec<RecordType>,
}

impl UpstreamConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            weight: default_weight(),
            capacity: default_capacity(),
            location: None,
            specializations: Vec::new(),
        }
    }
}

fn default_upstream_port() -> u16 {
    53
}

fn default_weight() -> f64 {
    1.0
}

fn default_capacity() -> u32 {
    100
}
