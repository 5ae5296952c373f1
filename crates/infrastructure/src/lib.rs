//! Query-processing engine for the Meridian DNS resolver.
//!
//! Everything that touches the wire, the cache, the blocklist, the
//! alternative-naming dispatch and the upstream pool lives under [`dns`].

pub mod dns;
