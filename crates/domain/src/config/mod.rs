mod alt_naming;
mod blocking;
mod cache;
mod health;
mod logging;
mod server;
mod upstream;

pub use alt_naming::AltNamingConfig;
pub use blocking::{BlockingConfig, MatchMode};
pub use cache::CacheConfig;
pub use health::HealthConfig;
pub use logging::LoggingConfig;
pub use server::ServerConfig;
pub use upstream::{SelectionStrategy, UpstreamConfig};

use crate::errors::ResolverError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Command-line overrides applied on top of the loaded file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

/// Full resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_upstreams")]
    pub upstreams: Vec<UpstreamConfig>,

    #[serde(default)]
    pub strategy: SelectionStrategy,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial per-upstream adaptive timeout in milliseconds.
    #[serde(default = "default_timeout_initial_ms")]
    pub timeout_initial_ms: u64,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub alt_naming: AltNamingConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstreams: default_upstreams(),
            strategy: SelectionStrategy::default(),
            max_retries: default_max_retries(),
            timeout_initial_ms: default_timeout_initial_ms(),
            cache: CacheConfig::default(),
            blocking: BlockingConfig::default(),
            alt_naming: AltNamingConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from a TOML file, falling back to defaults
    /// when no path is given, then apply CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ResolverError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(Path::new(p))
                    .map_err(|e| ResolverError::InvalidConfig(format!("{p}: {e}")))?;
                toml::from_str(&raw)
                    .map_err(|e| ResolverError::InvalidConfig(format!("{p}: {e}")))?
            }
            None => Self::default(),
        };

        if let Some(bind) = overrides.bind_address {
            config.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            config.server.port = port;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ResolverError> {
        if self.upstreams.is_empty() {
            return Err(ResolverError::InvalidConfig(
                "at least one upstream must be configured".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ResolverError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        for upstream in &self.upstreams {
            if upstream.address.parse::<std::net::Ipv4Addr>().is_err() {
                return Err(ResolverError::InvalidConfig(format!(
                    "upstream address '{}' is not an IPv4 address",
                    upstream.address
                )));
            }
            if upstream.capacity == 0 {
                return Err(ResolverError::InvalidConfig(format!(
                    "upstream '{}' capacity must be positive",
                    upstream.address
                )));
            }
        }
        let c = &self.cache;
        if c.hot_capacity == 0 || c.warm_capacity == 0 || c.cold_capacity == 0 {
            return Err(ResolverError::InvalidConfig(
                "cache tier capacities must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_upstreams() -> Vec<UpstreamConfig> {
    vec![
        UpstreamConfig::new("8.8.8.8", 53),
        UpstreamConfig::new("1.1.1.1", 53),
    ]
}

fn default_max_retries() -> usize {
    3
}

fn default_timeout_initial_ms() -> u64 {
    5_000
}
