pub mod alt_naming;
pub mod block_filter;
pub mod cache;
pub mod events;
pub mod load_balancer;
pub mod server;
pub mod transport;
pub mod wire;
