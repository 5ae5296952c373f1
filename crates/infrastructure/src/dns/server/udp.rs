use super::pipeline::QueryPipeline;
use crate::dns::wire::MAX_DATAGRAM;
use bytes::Bytes;
use meridian_dns_domain::ResolverError;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// The UDP listener.
///
/// A single receive loop reads datagrams into a 512-byte buffer and hands
/// each one to a spawned task; replies go out on the same socket.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    pipeline: Arc<QueryPipeline>,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Bind the listener. The resolver speaks IPv4 only.
    pub async fn bind(addr: SocketAddr, pipeline: Arc<QueryPipeline>) -> Result<Self, ResolverError> {
        if !addr.is_ipv4() {
            return Err(ResolverError::InvalidConfig(format!(
                "listen address {addr} is not IPv4"
            )));
        }

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;

        info!(addr = %local_addr, "UDP listener bound");

        Ok(Self {
            socket: Arc::new(socket),
            pipeline,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive loop; returns once `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), ResolverError> {
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("UDP listener shutting down");
                    return Ok(());
                }
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, src)) => {
                            let datagram = Bytes::copy_from_slice(&buf[..len]);
                            let socket = Arc::clone(&self.socket);
                            let pipeline = Arc::clone(&self.pipeline);
                            tokio::spawn(async move {
                                if let Some(reply) = pipeline.handle(datagram, src).await {
                                    if let Err(e) = socket.send_to(&reply, src).await {
                                        debug!(client = %src, error = %e, "failed to send reply");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "error receiving datagram");
                        }
                    }
                }
            }
        }
    }
}
