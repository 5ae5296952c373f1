mod udp;

pub use udp::UdpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use meridian_dns_domain::ResolverError;
use std::net::SocketAddr;
use std::time::Duration;

/// One-shot query exchange with an upstream server.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Send `query` to `server` and wait up to `timeout` for the reply.
    async fn send(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, ResolverError>;

    fn protocol_name(&self) -> &'static str;
}
