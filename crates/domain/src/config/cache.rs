use serde::{Deserialize, Serialize};

/// Tiered cache sizing and TTL policy.
///
/// The hot tier holds roughly 10% of the nominal capacity, the warm tier
/// 50%, and the cold tier the full nominal capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_hot_capacity")]
    pub hot_capacity: usize,

    #[serde(default = "default_warm_capacity")]
    pub warm_capacity: usize,

    #[serde(default = "default_cold_capacity")]
    pub cold_capacity: usize,

    /// TTL applied to upstream responses that carry no answer records.
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// TTL applied to cached NXDOMAIN responses.
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl: u32,

    /// Seconds between expired-entry sweeps.
    #[serde(default = "default_compaction_interval")]
    pub compaction_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            hot_capacity: default_hot_capacity(),
            warm_capacity: default_warm_capacity(),
            cold_capacity: default_cold_capacity(),
            default_ttl: default_ttl(),
            negative_ttl: default_negative_ttl(),
            compaction_interval_secs: default_compaction_interval(),
        }
    }
}

fn default_hot_capacity() -> usize {
    1_000
}

fn default_warm_capacity() -> usize {
    5_000
}

fn default_cold_capacity() -> usize {
    10_000
}

fn default_ttl() -> u32 {
    300
}

fn default_negative_ttl() -> u32 {
    300
}

fn default_compaction_interval() -> u64 {
    30
}
