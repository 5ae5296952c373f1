use crate::dns::alt_naming::{AltNamingRegistry, NamingScheme};
use crate::dns::block_filter::BlockFilter;
use crate::dns::cache::{BorrowedFingerprint, Fingerprint, TieredCache};
use crate::dns::events::{EventSink, QueryEvent};
use crate::dns::load_balancer::{LoadBalancer, QueryContext};
use crate::dns::wire::{
    build_a_record_response, build_nxdomain_in_place, build_servfail_in_place, min_answer_ttl,
    response_code, rewrite_id, QueryView, QCLASS_IN, QTYPE_A, RCODE_NOERROR, RCODE_NXDOMAIN,
};
use bytes::Bytes;
use compact_str::CompactString;
use meridian_dns_domain::CacheConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// The query-processing pipeline.
///
/// Stages run in order — parse, alternative-naming dispatch, block filter,
/// cache, upstream — and any stage may produce the final response. The
/// reply always carries the request id.
pub struct QueryPipeline {
    cache: Arc<TieredCache>,
    block_filter: Arc<BlockFilter>,
    alt_naming: Arc<AltNamingRegistry>,
    balancer: Arc<LoadBalancer>,
    events: Arc<dyn EventSink>,
    default_ttl: u32,
    negative_ttl: u32,
}

impl QueryPipeline {
    pub fn new(
        cache: Arc<TieredCache>,
        block_filter: Arc<BlockFilter>,
        alt_naming: Arc<AltNamingRegistry>,
        balancer: Arc<LoadBalancer>,
        events: Arc<dyn EventSink>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            cache,
            block_filter,
            alt_naming,
            balancer,
            events,
            default_ttl: cache_config.default_ttl,
            negative_ttl: cache_config.negative_ttl,
        }
    }

    /// Process one datagram. `None` means no response is sent (malformed
    /// query).
    pub async fn handle(&self, datagram: Bytes, peer: SocketAddr) -> Option<Bytes> {
        let view = match QueryView::parse(&datagram) {
            Ok(view) => view,
            Err(e) => {
                trace!(client = %peer, error = %e, "dropping unparseable datagram");
                return None;
            }
        };

        let name: CompactString = view.qname().chars().map(|c| c.to_ascii_lowercase()).collect();

        // Alternative naming runs before policy: blocklists only govern
        // conventional names.
        if let Some(scheme) = NamingScheme::classify(&name) {
            return Some(self.resolve_alt_naming(scheme, &view, &name).await);
        }

        if self.block_filter.check(&name) {
            self.events.log(&QueryEvent::Blocked {
                name: name.clone(),
                qtype: view.qtype(),
            });
            let mut reply = datagram.to_vec();
            build_nxdomain_in_place(&mut reply);
            return Some(Bytes::from(reply));
        }

        let key = BorrowedFingerprint::new(&name, view.qtype(), view.qclass());
        let now = Instant::now();
        if let Some(entry) = self.cache.get(&key, now) {
            self.events.log(&QueryEvent::CacheHit {
                name: name.clone(),
                qtype: view.qtype(),
                remaining_ttl_secs: entry.remaining_ttl_secs(now),
            });
            let mut reply = entry.response().to_vec();
            rewrite_id(&mut reply, view.id());
            return Some(Bytes::from(reply));
        }

        let ctx = QueryContext::new(view.qtype()).with_recursion_desired(view.recursion_desired());
        match self.balancer.execute(&datagram, &ctx).await {
            Ok(result) => {
                self.cache_response(&name, &view, &result.response, now);
                self.events.log(&QueryEvent::Resolved {
                    name,
                    qtype: view.qtype(),
                    server: result.server,
                    latency_ms: result.latency_ms,
                });
                // The id was forwarded verbatim, so this is a no-op unless
                // an upstream misbehaved.
                let mut reply = result.response.to_vec();
                rewrite_id(&mut reply, view.id());
                Some(Bytes::from(reply))
            }
            Err(e) => {
                trace!(name = %name, error = %e, "upstream resolution failed");
                self.events.log(&QueryEvent::ServFail {
                    name,
                    qtype: view.qtype(),
                });
                let mut reply = datagram.to_vec();
                build_servfail_in_place(&mut reply);
                Some(Bytes::from(reply))
            }
        }
    }

    /// Cache a conventional upstream response under the query fingerprint.
    /// Only clean answers and NXDOMAIN are worth keeping.
    fn cache_response(&self, name: &str, view: &QueryView<'_>, response: &Bytes, now: Instant) {
        let base_ttl = match response_code(response) {
            Some(RCODE_NOERROR) => min_answer_ttl(response).unwrap_or(self.default_ttl),
            Some(RCODE_NXDOMAIN) => self.negative_ttl,
            _ => return,
        };
        let key = BorrowedFingerprint::new(name, view.qtype(), view.qclass());
        let ttl = self.cache.adjust_ttl(&key, base_ttl, now);
        self.cache
            .put(key.to_owned(), response.clone(), ttl, now);
    }

    async fn resolve_alt_naming(
        &self,
        scheme: NamingScheme,
        view: &QueryView<'_>,
        name: &CompactString,
    ) -> Bytes {
        match self.alt_naming.resolve(scheme, name).await {
            Ok(Some(resolution)) if !resolution.addresses.is_empty() => {
                let response = build_a_record_response(view.raw(), resolution.addresses[0]);
                let key = Fingerprint::new(name, QTYPE_A, QCLASS_IN);
                self.cache.put(
                    key,
                    Bytes::from(response.clone()),
                    resolution.ttl,
                    Instant::now(),
                );
                self.events.log(&QueryEvent::AltNamingResolved {
                    name: name.clone(),
                    scheme,
                });
                Bytes::from(response)
            }
            Ok(_) | Err(_) => {
                self.events.log(&QueryEvent::AltNamingMiss {
                    name: name.clone(),
                    scheme,
                });
                let mut reply = view.raw().to_vec();
                build_nxdomain_in_place(&mut reply);
                Bytes::from(reply)
            }
        }
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn balancer(&self) -> &Arc<LoadBalancer> {
        &self.balancer
    }
}
