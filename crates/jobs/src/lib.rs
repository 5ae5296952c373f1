//! Long-running maintenance tasks: upstream health evaluation, circuit
//! breaker upkeep and cache compaction. Each job is a tokio task on a
//! fixed interval that stops when the shared cancellation token fires.

mod breaker_scan;
mod cache_compaction;
mod health_monitor;
mod runner;

pub use breaker_scan::BreakerScanJob;
pub use cache_compaction::CacheCompactionJob;
pub use health_monitor::HealthMonitorJob;
pub use runner::JobRunner;
