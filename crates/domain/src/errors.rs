use std::net::SocketAddr;
use thiserror::Error;

/// Errors produced while decoding or encoding DNS wire format.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("datagram shorter than the 12-byte DNS header")]
    Truncated,

    #[error("label length {0} exceeds the 63-octet limit")]
    InvalidLabel(u8),

    #[error("question name has no labels")]
    EmptyName,

    #[error("compression pointer inside the question section")]
    CompressionPointer,

    #[error("expected exactly one question, found {0}")]
    QuestionCount(u16),

    #[error("domain name exceeds 253 octets")]
    NameTooLong,
}

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no healthy upstream available")]
    NoHealthyUpstream,

    #[error("all upstream attempts failed")]
    AllUpstreamsFailed,

    #[error("upstream {server} timed out after {elapsed_ms} ms")]
    UpstreamTimeout { server: SocketAddr, elapsed_ms: u64 },

    #[error("upstream {server} transport error: {message}")]
    UpstreamTransport { server: SocketAddr, message: String },

    #[error("alternative naming resolver failed: {0}")]
    AltNaming(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResolverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
