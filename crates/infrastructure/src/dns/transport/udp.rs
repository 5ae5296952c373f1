use super::DnsTransport;
use crate::dns::wire::MAX_DATAGRAM;
use async_trait::async_trait;
use bytes::Bytes;
use meridian_dns_domain::ResolverError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// DNS over UDP with one ephemeral socket per query.
///
/// The socket is connected to the upstream, so the kernel filters replies
/// from other sources and surfaces ICMP port-unreachable as a recv error.
#[derive(Debug, Default)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        Self
    }

    fn transport_error(server: SocketAddr, e: impl std::fmt::Display) -> ResolverError {
        ResolverError::UpstreamTransport {
            server,
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, ResolverError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Self::transport_error(server, e))?;
        socket
            .connect(server)
            .await
            .map_err(|e| Self::transport_error(server, e))?;

        let timeout_err = || ResolverError::UpstreamTimeout {
            server,
            elapsed_ms: timeout.as_millis() as u64,
        };

        let sent = tokio::time::timeout(timeout, socket.send(query))
            .await
            .map_err(|_| timeout_err())?
            .map_err(|e| Self::transport_error(server, e))?;
        debug!(upstream = %server, bytes_sent = sent, "upstream query sent");

        let mut buf = [0u8; MAX_DATAGRAM];
        let received = tokio::time::timeout(timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| timeout_err())?
            .map_err(|e| Self::transport_error(server, e))?;
        debug!(upstream = %server, bytes_received = received, "upstream response received");

        Ok(Bytes::copy_from_slice(&buf[..received]))
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
