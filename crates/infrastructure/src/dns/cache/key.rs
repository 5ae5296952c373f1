use equivalent::Equivalent;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Cache key: normalised lowercase dotted qname plus qtype and qclass.
///
/// Responses for different qtypes on the same name are distinct entries.
#[derive(Clone, Debug, Eq)]
pub struct Fingerprint {
    pub name: Arc<str>,
    pub qtype: u16,
    pub qclass: u16,
}

impl Fingerprint {
    /// Build a fingerprint, lowercasing the name if needed.
    pub fn new(name: &str, qtype: u16, qclass: u16) -> Self {
        let name: Arc<str> = if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Arc::from(name.to_ascii_lowercase())
        } else {
            Arc::from(name)
        };
        Self {
            name,
            qtype,
            qclass,
        }
    }
}

impl Hash for Fingerprint {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        let s: &str = &self.name;
        s.hash(state);
        self.qtype.hash(state);
        self.qclass.hash(state);
    }
}

impl PartialEq for Fingerprint {
    #[inline]
    fn eq(&self, other: &Fingerprint) -> bool {
        self.qtype == other.qtype && self.qclass == other.qclass && self.name == other.name
    }
}

/// Zero-allocation lookup key over an already-lowercased name.
///
/// Hashes identically to [`Fingerprint`] and implements
/// [`equivalent::Equivalent`], so the hashbrown-backed tier maps accept it
/// directly without building an owned key on the hot path.
#[derive(Debug, Clone, Copy)]
pub struct BorrowedFingerprint<'a> {
    pub name: &'a str,
    pub qtype: u16,
    pub qclass: u16,
}

impl<'a> BorrowedFingerprint<'a> {
    #[inline]
    pub fn new(name: &'a str, qtype: u16, qclass: u16) -> Self {
        debug_assert!(!name.bytes().any(|b| b.is_ascii_uppercase()));
        Self {
            name,
            qtype,
            qclass,
        }
    }

    pub fn to_owned(self) -> Fingerprint {
        Fingerprint {
            name: Arc::from(self.name),
            qtype: self.qtype,
            qclass: self.qclass,
        }
    }
}

impl Hash for BorrowedFingerprint<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.qtype.hash(state);
        self.qclass.hash(state);
    }
}

impl Equivalent<Fingerprint> for BorrowedFingerprint<'_> {
    #[inline]
    fn equivalent(&self, key: &Fingerprint) -> bool {
        self.qtype == key.qtype && self.qclass == key.qclass && self.name == key.name.as_ref()
    }
}
