//! Query-path events handed to a pluggable sink.
//!
//! The pipeline only promises to invoke the sink; what happens to the
//! events (log file, metrics, nothing) is the embedder's business.

use super::alt_naming::NamingScheme;
use compact_str::CompactString;
use meridian_dns_domain::RecordType;
use std::net::SocketAddr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum QueryEvent {
    Blocked {
        name: CompactString,
        qtype: u16,
    },
    CacheHit {
        name: CompactString,
        qtype: u16,
        remaining_ttl_secs: u64,
    },
    Resolved {
        name: CompactString,
        qtype: u16,
        server: SocketAddr,
        latency_ms: u64,
    },
    AltNamingResolved {
        name: CompactString,
        scheme: NamingScheme,
    },
    AltNamingMiss {
        name: CompactString,
        scheme: NamingScheme,
    },
    ServFail {
        name: CompactString,
        qtype: u16,
    },
}

pub trait EventSink: Send + Sync {
    fn log(&self, event: &QueryEvent);
}

/// Default sink: structured tracing output.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn log(&self, event: &QueryEvent) {
        match event {
            QueryEvent::Blocked { name, qtype } => {
                info!(name = %name, qtype = %RecordType::display_qtype(*qtype), "query blocked");
            }
            QueryEvent::CacheHit {
                name,
                qtype,
                remaining_ttl_secs,
            } => {
                debug!(
                    name = %name,
                    qtype = %RecordType::display_qtype(*qtype),
                    remaining_ttl_secs,
                    "cache hit"
                );
            }
            QueryEvent::Resolved {
                name,
                qtype,
                server,
                latency_ms,
            } => {
                debug!(
                    name = %name,
                    qtype = %RecordType::display_qtype(*qtype),
                    upstream = %server,
                    latency_ms,
                    "resolved upstream"
                );
            }
            QueryEvent::AltNamingResolved { name, scheme } => {
                debug!(name = %name, scheme = %scheme, "alternative naming resolved");
            }
            QueryEvent::AltNamingMiss { name, scheme } => {
                debug!(name = %name, scheme = %scheme, "alternative naming miss");
            }
            QueryEvent::ServFail { name, qtype } => {
                warn!(
                    name = %name,
                    qtype = %RecordType::display_qtype(*qtype),
                    "all upstreams failed"
                );
            }
        }
    }
}

/// Sink that discards everything; for embedders that do their own
/// accounting and for tests.
#[derive(Debug, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn log(&self, _event: &QueryEvent) {}
}
