use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record types the resolver is aware of by name.
///
/// The wire layer works on raw 16-bit qtypes; this enum exists for
/// configuration (upstream specialisations) and human-readable logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    PTR,
    SOA,
    SRV,
    TXT,
    CAA,
    HTTPS,
}

impl RecordType {
    pub fn qtype(&self) -> u16 {
        match self {
            Self::A => 1,
            Self::NS => 2,
            Self::CNAME => 5,
            Self::SOA => 6,
            Self::PTR => 12,
            Self::MX => 15,
            Self::TXT => 16,
            Self::AAAA => 28,
            Self::SRV => 33,
            Self::HTTPS => 65,
            Self::CAA => 257,
        }
    }

    pub fn from_qtype(qtype: u16) -> Option<Self> {
        match qtype {
            1 => Some(Self::A),
            2 => Some(Self::NS),
            5 => Some(Self::CNAME),
            6 => Some(Self::SOA),
            12 => Some(Self::PTR),
            15 => Some(Self::MX),
            16 => Some(Self::TXT),
            28 => Some(Self::AAAA),
            33 => Some(Self::SRV),
            65 => Some(Self::HTTPS),
            257 => Some(Self::CAA),
            _ => None,
        }
    }

    /// Display name for a raw qtype, falling back to the RFC 3597 form.
    pub fn display_qtype(qtype: u16) -> String {
        match Self::from_qtype(qtype) {
            Some(rt) => rt.to_string(),
            None => format!("TYPE{qtype}"),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::NS => "NS",
            Self::PTR => "PTR",
            Self::SOA => "SOA",
            Self::SRV => "SRV",
            Self::TXT => "TXT",
            Self::CAA => "CAA",
            Self::HTTPS => "HTTPS",
        };
        f.write_str(s)
    }
}

impl FromStr for RecordType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::AAAA),
            "CNAME" => Ok(Self::CNAME),
            "MX" => Ok(Self::MX),
            "NS" => Ok(Self::NS),
            "PTR" => Ok(Self::PTR),
            "SOA" => Ok(Self::SOA),
            "SRV" => Ok(Self::SRV),
            "TXT" => Ok(Self::TXT),
            "CAA" => Ok(Self::CAA),
            "HTTPS" => Ok(Self::HTTPS),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qtype_round_trip() {
        for rt in [
            RecordType::A,
            RecordType::AAAA,
            RecordType::MX,
            RecordType::SRV,
            RecordType::CAA,
        ] {
            assert_eq!(RecordType::from_qtype(rt.qtype()), Some(rt));
        }
    }

    #[test]
    fn unknown_qtype_uses_generic_form() {
        assert_eq!(RecordType::display_qtype(4242), "TYPE4242");
        assert_eq!(RecordType::display_qtype(1), "A");
    }
}
