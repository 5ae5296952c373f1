//! DNS wire format: a zero-copy question view over inbound datagrams and
//! the handful of response shapes the resolver emits itself.

mod message_builder;
mod query_view;

pub use message_builder::{
    build_a_record_response, build_nxdomain_in_place, build_query, build_servfail_in_place,
    min_answer_ttl, response_code, rewrite_id,
};
pub use query_view::QueryView;

/// Fixed DNS header length.
pub const HEADER_LEN: usize = 12;

/// Maximum UDP payload the resolver reads or forwards.
pub const MAX_DATAGRAM: usize = 512;

pub const QTYPE_A: u16 = 1;
pub const QCLASS_IN: u16 = 1;

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
