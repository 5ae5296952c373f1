//! Domain types for the Meridian DNS resolver: configuration, shared
//! value types and error enums. No I/O lives here.

pub mod config;
pub mod errors;
pub mod geo;
pub mod record_type;

pub use config::{
    AltNamingConfig, BlockingConfig, CacheConfig, CliOverrides, Config, HealthConfig,
    LoggingConfig, MatchMode, SelectionStrategy, ServerConfig, UpstreamConfig,
};
pub use errors::{ParseError, ResolverError};
pub use geo::GeoPoint;
pub use record_type::RecordType;
