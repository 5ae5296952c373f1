use meridian_dns_domain::UpstreamConfig;
use meridian_dns_infrastructure::dns::wire::build_a_record_response;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;

/// How a mock upstream treats incoming queries.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Echo the query with one A answer for the given address.
    RespondA(Ipv4Addr),
    /// Swallow queries; clients run into their timeout.
    Silent,
    /// Reply with a header fragment too short to be a DNS message.
    ShortReply,
}

/// An in-process upstream DNS server bound to an ephemeral port.
pub struct MockUpstream {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start(behavior: MockBehavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&queries);

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            loop {
                let Ok((len, src)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                match behavior {
                    MockBehavior::RespondA(ip) => {
                        let reply = build_a_record_response(&buf[..len], ip);
                        let _ = socket.send_to(&reply, src).await;
                    }
                    MockBehavior::Silent => {}
                    MockBehavior::ShortReply => {
                        let _ = socket.send_to(&buf[..len.min(4)], src).await;
                    }
                }
            }
        });

        Self { addr, queries }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Upstream configuration pointing at this mock.
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig::new("127.0.0.1", self.addr.port())
    }
}
