use super::HEADER_LEN;
use meridian_dns_domain::ParseError;
use std::net::Ipv4Addr;

const FLAG_QR: u8 = 0x80;
const FLAG_RD: u8 = 0x01;
const POINTER_MASK: u8 = 0xC0;
const MAX_LABEL: usize = 63;
const MAX_NAME: usize = 253;

/// TTL stamped on synthesised A records.
const SYNTHESIZED_TTL: u32 = 300;

/// Serialise a one-question query.
pub fn build_query(
    name: &str,
    qtype: u16,
    qclass: u16,
    id: u16,
    recursion_desired: bool,
) -> Result<Vec<u8>, ParseError> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Err(ParseError::EmptyName);
    }
    if name.len() > MAX_NAME {
        return Err(ParseError::NameTooLong);
    }

    let mut out = Vec::with_capacity(HEADER_LEN + name.len() + 6);
    out.extend_from_slice(&id.to_be_bytes());
    out.push(if recursion_desired { FLAG_RD } else { 0 });
    out.push(0);
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0; 6]);

    for label in name.split('.') {
        if label.is_empty() {
            return Err(ParseError::EmptyName);
        }
        if label.len() > MAX_LABEL {
            return Err(ParseError::InvalidLabel(label.len() as u8));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out.extend_from_slice(&qtype.to_be_bytes());
    out.extend_from_slice(&qclass.to_be_bytes());

    Ok(out)
}

/// Turn a query buffer into an NXDOMAIN response in place: QR=1, RCODE=3,
/// answer/authority/additional counts zeroed, id and question untouched.
pub fn build_nxdomain_in_place(buf: &mut [u8]) {
    set_response_code_in_place(buf, super::RCODE_NXDOMAIN);
}

/// Turn a query buffer into a SERVFAIL response in place.
pub fn build_servfail_in_place(buf: &mut [u8]) {
    set_response_code_in_place(buf, super::RCODE_SERVFAIL);
}

fn set_response_code_in_place(buf: &mut [u8], rcode: u8) {
    if buf.len() < HEADER_LEN {
        return;
    }
    buf[2] |= FLAG_QR;
    buf[3] = (buf[3] & 0xF0) | (rcode & 0x0F);
    // ANCOUNT, NSCOUNT, ARCOUNT
    buf[6..HEADER_LEN].fill(0);
}

/// Synthesise an A-record response: the query echoed as the prefix with
/// QR=1 and ANCOUNT=1, followed by one answer whose name is a compression
/// pointer to the question at offset 12.
pub fn build_a_record_response(query: &[u8], addr: Ipv4Addr) -> Vec<u8> {
    let mut out = Vec::with_capacity(query.len() + 16);
    out.extend_from_slice(query);
    if out.len() >= HEADER_LEN {
        out[2] |= FLAG_QR;
        out[6..8].copy_from_slice(&1u16.to_be_bytes());
    }
    out.extend_from_slice(&[0xC0, HEADER_LEN as u8]);
    out.extend_from_slice(&super::QTYPE_A.to_be_bytes());
    out.extend_from_slice(&super::QCLASS_IN.to_be_bytes());
    out.extend_from_slice(&SYNTHESIZED_TTL.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&addr.octets());
    out
}

/// Copy a fresh transaction id over the first two bytes.
pub fn rewrite_id(buf: &mut [u8], id: u16) {
    if buf.len() >= 2 {
        buf[..2].copy_from_slice(&id.to_be_bytes());
    }
}

/// Response code from the header, if the buffer is long enough to have one.
pub fn response_code(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    Some(bytes[3] & 0x0F)
}

/// Smallest TTL across the answer records of a response.
///
/// Walks the question and answer sections, following nothing: a name is
/// either a label sequence or the 2-byte pointer form. Returns `None` for
/// answerless or malformed responses.
pub fn min_answer_ttl(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    let qdcount = u16::from_be_bytes([bytes[4], bytes[5]]);
    let ancount = u16::from_be_bytes([bytes[6], bytes[7]]);
    if ancount == 0 {
        return None;
    }

    let mut pos = HEADER_LEN;
    for _ in 0..qdcount {
        pos = skip_name(bytes, pos)?;
        pos = pos.checked_add(4).filter(|&p| p <= bytes.len())?;
    }

    let mut min_ttl: Option<u32> = None;
    for _ in 0..ancount {
        pos = skip_name(bytes, pos)?;
        let fixed = bytes.get(pos..pos + 10)?;
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
        pos = (pos + 10).checked_add(rdlength).filter(|&p| p <= bytes.len())?;
        min_ttl = Some(min_ttl.map_or(ttl, |m| m.min(ttl)));
    }
    min_ttl
}

/// Advance past a wire-format name starting at `pos`.
fn skip_name(bytes: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let len = *bytes.get(pos)?;
        if len & POINTER_MASK == POINTER_MASK {
            return Some(pos + 2).filter(|&p| p <= bytes.len());
        }
        pos += 1;
        if len == 0 {
            return Some(pos);
        }
        pos += len as usize;
        if pos > bytes.len() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::wire::{QCLASS_IN, QTYPE_A};

    #[test]
    fn nxdomain_in_place_sets_flags_and_zeroes_counts() {
        let mut buf = build_query("ads.example.com", QTYPE_A, QCLASS_IN, 0x1234, true).unwrap();
        build_nxdomain_in_place(&mut buf);
        assert_eq!(u16::from_be_bytes([buf[0], buf[1]]), 0x1234);
        assert_eq!(buf[2] & 0x80, 0x80, "QR must be set");
        assert_eq!(buf[3] & 0x0F, 3, "RCODE must be NXDOMAIN");
        assert_eq!(u16::from_be_bytes([buf[4], buf[5]]), 1, "question kept");
        assert_eq!(&buf[6..12], &[0u8; 6], "counts zeroed");
    }

    #[test]
    fn servfail_in_place_sets_rcode_two() {
        let mut buf = build_query("example.com", QTYPE_A, QCLASS_IN, 7, true).unwrap();
        build_servfail_in_place(&mut buf);
        assert_eq!(buf[2] & 0x80, 0x80);
        assert_eq!(buf[3] & 0x0F, 2);
    }

    #[test]
    fn a_record_response_layout() {
        let query = build_query("vitalik.eth", QTYPE_A, QCLASS_IN, 0xABCD, true).unwrap();
        let response = build_a_record_response(&query, Ipv4Addr::new(192, 168, 1, 100));

        assert_eq!(&response[..2], &query[..2]);
        assert_eq!(response[2] & 0x80, 0x80);
        assert_eq!(u16::from_be_bytes([response[6], response[7]]), 1);

        let answer = &response[query.len()..];
        assert_eq!(&answer[..2], &[0xC0, 0x0C], "pointer to offset 12");
        assert_eq!(&answer[2..4], &[0x00, 0x01], "TYPE=A");
        assert_eq!(&answer[4..6], &[0x00, 0x01], "CLASS=IN");
        assert_eq!(
            u32::from_be_bytes([answer[6], answer[7], answer[8], answer[9]]),
            300
        );
        assert_eq!(&answer[10..12], &[0x00, 0x04]);
        assert_eq!(&answer[12..16], &[0xC0, 0xA8, 0x01, 0x64]);
    }

    #[test]
    fn rewrite_id_replaces_first_two_bytes() {
        let mut buf = build_query("example.com", QTYPE_A, QCLASS_IN, 0xAAAA, true).unwrap();
        rewrite_id(&mut buf, 0xBEEF);
        assert_eq!(&buf[..2], &[0xBE, 0xEF]);
    }

    #[test]
    fn min_ttl_over_synthesised_answer() {
        let query = build_query("example.com", QTYPE_A, QCLASS_IN, 1, true).unwrap();
        let response = build_a_record_response(&query, Ipv4Addr::new(1, 2, 3, 4));
        assert_eq!(min_answer_ttl(&response), Some(300));
        assert_eq!(response_code(&response), Some(0));
    }

    #[test]
    fn min_ttl_none_without_answers() {
        let query = build_query("example.com", QTYPE_A, QCLASS_IN, 1, true).unwrap();
        assert_eq!(min_answer_ttl(&query), None);
    }

    #[test]
    fn min_ttl_picks_smallest_of_two() {
        let query = build_query("example.com", QTYPE_A, QCLASS_IN, 1, true).unwrap();
        let mut response = build_a_record_response(&query, Ipv4Addr::new(1, 2, 3, 4));
        // Second answer, TTL 120
        response[7] = 2;
        response.extend_from_slice(&[0xC0, 0x0C]);
        response.extend_from_slice(&QTYPE_A.to_be_bytes());
        response.extend_from_slice(&QCLASS_IN.to_be_bytes());
        response.extend_from_slice(&120u32.to_be_bytes());
        response.extend_from_slice(&4u16.to_be_bytes());
        response.extend_from_slice(&[5, 6, 7, 8]);
        assert_eq!(min_answer_ttl(&response), Some(120));
    }

    #[test]
    fn min_ttl_rejects_truncated_answer() {
        let query = build_query("example.com", QTYPE_A, QCLASS_IN, 1, true).unwrap();
        let mut response = build_a_record_response(&query, Ipv4Addr::new(1, 2, 3, 4));
        response.truncate(response.len() - 2);
        assert_eq!(min_answer_ttl(&response), None);
    }

    #[test]
    fn build_query_rejects_bad_names() {
        assert_eq!(
            build_query("", QTYPE_A, QCLASS_IN, 1, true),
            Err(ParseError::EmptyName)
        );
        let long_label = "a".repeat(64);
        assert_eq!(
            build_query(&long_label, QTYPE_A, QCLASS_IN, 1, true),
            Err(ParseError::InvalidLabel(64))
        );
        let long_name = ["a"; 140].join(".");
        assert_eq!(
            build_query(&long_name, QTYPE_A, QCLASS_IN, 1, true),
            Err(ParseError::NameTooLong)
        );
    }
}
