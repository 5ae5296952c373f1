//! Dispatch for non-ICANN top-level labels.
//!
//! The core only knows how to classify a name into a scheme and hand it to
//! whatever resolver is registered for that scheme; the resolution
//! mechanism behind the capability is a collaborator's concern.

mod scheme;

pub use scheme::NamingScheme;

use async_trait::async_trait;
use meridian_dns_domain::ResolverError;
use rustc_hash::FxHashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// What an alternative name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// A plain host address record.
    Address,
    /// A content hash or gateway redirect surfaced as an address.
    Content,
}

/// Successful alternative-naming resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub addresses: Vec<Ipv4Addr>,
    pub ttl: u32,
    pub kind: ResolutionKind,
}

/// Capability implemented by each naming-scheme resolver.
#[async_trait]
pub trait AltNamingResolver: Send + Sync {
    /// Resolve a qname; `Ok(None)` means the name does not exist in the
    /// scheme's namespace.
    async fn resolve(&self, qname: &str) -> Result<Option<Resolution>, ResolverError>;
}

/// Scheme → resolver table consulted by the pipeline.
#[derive(Default)]
pub struct AltNamingRegistry {
    resolvers: FxHashMap<NamingScheme, Arc<dyn AltNamingResolver>>,
}

impl AltNamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scheme: NamingScheme, resolver: Arc<dyn AltNamingResolver>) {
        self.resolvers.insert(scheme, resolver);
    }

    /// Resolve via the scheme's registered resolver; an unregistered
    /// scheme behaves like a miss.
    pub async fn resolve(
        &self,
        scheme: NamingScheme,
        qname: &str,
    ) -> Result<Option<Resolution>, ResolverError> {
        match self.resolvers.get(&scheme) {
            Some(resolver) => resolver.resolve(qname).await,
            None => Ok(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

/// Fixed name → address table.
///
/// Stands in for on-chain resolvers in local deployments and tests.
pub struct StaticTableResolver {
    table: FxHashMap<String, Ipv4Addr>,
    ttl: u32,
}

impl StaticTableResolver {
    pub fn new(ttl: u32) -> Self {
        Self {
            table: FxHashMap::default(),
            ttl,
        }
    }

    pub fn with_entry(mut self, qname: impl Into<String>, addr: Ipv4Addr) -> Self {
        self.table.insert(qname.into(), addr);
        self
    }
}

#[async_trait]
impl AltNamingResolver for StaticTableResolver {
    async fn resolve(&self, qname: &str) -> Result<Option<Resolution>, ResolverError> {
        Ok(self.table.get(qname).map(|addr| Resolution {
            addresses: vec![*addr],
            ttl: self.ttl,
            kind: ResolutionKind::Address,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_resolves_via_registered_resolver() {
        let mut registry = AltNamingRegistry::new();
        registry.register(
            NamingScheme::Ens,
            Arc::new(
                StaticTableResolver::new(300)
                    .with_entry("vitalik.eth", Ipv4Addr::new(192, 168, 1, 100)),
            ),
        );

        let resolution = registry
            .resolve(NamingScheme::Ens, "vitalik.eth")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolution.addresses, vec![Ipv4Addr::new(192, 168, 1, 100)]);
        assert_eq!(resolution.ttl, 300);
    }

    #[tokio::test]
    async fn unknown_name_is_a_miss() {
        let mut registry = AltNamingRegistry::new();
        registry.register(NamingScheme::Ens, Arc::new(StaticTableResolver::new(300)));
        assert!(registry
            .resolve(NamingScheme::Ens, "nobody.eth")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unregistered_scheme_is_a_miss() {
        let registry = AltNamingRegistry::new();
        assert!(registry
            .resolve(NamingScheme::Cns, "a.cns")
            .await
            .unwrap()
            .is_none());
    }
}
