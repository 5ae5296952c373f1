mod pipeline;
mod udp;

pub use pipeline::QueryPipeline;
pub use udp::UdpServer;
