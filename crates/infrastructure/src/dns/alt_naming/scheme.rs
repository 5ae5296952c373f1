use std::fmt;

/// Alternative-naming families keyed by their non-ICANN top-level labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingScheme {
    /// Ethereum Name Service: `.eth`
    Ens,
    /// Unstoppable Domains: `.crypto`, `.nft`, `.blockchain`, `.bitcoin`,
    /// `.wallet`, `.888`, `.dao`, `.x`
    Uns,
    /// Zilliqa Name Service: `.ghost`, `.zns`
    Zns,
    /// Conflux Name Service: `.cns`
    Cns,
}

impl NamingScheme {
    /// Select a scheme by exact TLD match, or none for conventional names.
    pub fn classify(qname: &str) -> Option<Self> {
        let tld = qname.rsplit('.').next()?;
        match tld {
            "eth" => Some(Self::Ens),
            "crypto" | "nft" | "blockchain" | "bitcoin" | "wallet" | "888" | "dao" | "x" => {
                Some(Self::Uns)
            }
            "ghost" | "zns" => Some(Self::Zns),
            "cns" => Some(Self::Cns),
            _ => None,
        }
    }

    /// Configuration key for this scheme.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ens => "ens",
            Self::Uns => "uns",
            Self::Zns => "zns",
            Self::Cns => "cns",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ens" => Some(Self::Ens),
            "uns" => Some(Self::Uns),
            "zns" => Some(Self::Zns),
            "cns" => Some(Self::Cns),
            _ => None,
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ens => "ENS",
            Self::Uns => "UNS",
            Self::Zns => "ZNS",
            Self::Cns => "CNS",
        };
        f.write_str(s)
    }
}
