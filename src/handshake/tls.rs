//! TLS record decoding.
//!
//! Decodes the outer record header and, for ClientHello handshakes,
//! enough of the hello body to list the offered cipher suites. Once the
//! 5-byte record minimum is met the decoder never fails: a step that runs
//! out of bytes stops the walk and returns the record built so far.

use phf::phf_map;

use crate::error::{GatewayError, Result};

use super::CONTENT_TYPE_HANDSHAKE;

/// Minimum bytes for the record header: type, version, length.
pub const RECORD_HEADER_LEN: usize = 5;

/// Handshake type byte for ClientHello.
pub const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
/// Handshake type byte for ServerHello.
pub const HANDSHAKE_SERVER_HELLO: u8 = 0x02;

/// TLS cipher suite names by 2-byte code.
static TLS_CIPHER_SUITES: phf::Map<u16, &'static str> = phf_map! {
    0x0004u16 => "TLS_RSA_WITH_RC4_128_MD5",
    0x0005u16 => "TLS_RSA_WITH_RC4_128_SHA",
    0x000au16 => "TLS_RSA_WITH_3DES_EDE_CBC_SHA",
    0x002fu16 => "TLS_RSA_WITH_AES_128_CBC_SHA",
    0x0035u16 => "TLS_RSA_WITH_AES_256_CBC_SHA",
    0x003cu16 => "TLS_RSA_WITH_AES_128_CBC_SHA256",
    0x003du16 => "TLS_RSA_WITH_AES_256_CBC_SHA256",
    0x009cu16 => "TLS_RSA_WITH_AES_128_GCM_SHA256",
    0x009du16 => "TLS_RSA_WITH_AES_256_GCM_SHA384",
    0xc009u16 => "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA",
    0xc00au16 => "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA",
    0xc013u16 => "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA",
    0xc014u16 => "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA",
    0xc02bu16 => "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    0xc02cu16 => "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    0xc02fu16 => "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    0xc030u16 => "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    0x1301u16 => "TLS_AES_128_GCM_SHA256",
    0x1302u16 => "TLS_AES_256_GCM_SHA384",
    0x1303u16 => "TLS_CHACHA20_POLY1305_SHA256",
    0x00ffu16 => "TLS_EMPTY_RENEGOTIATION_INFO_SCSV",
};

/// Resolve a 2-byte cipher suite code to its name, or an `UNKNOWN(0x…)`
/// placeholder carrying the raw hex.
pub fn cipher_suite_name(code: u16) -> String {
    match TLS_CIPHER_SUITES.get(&code) {
        Some(name) => (*name).to_string(),
        None => format!("UNKNOWN(0x{code:04x})"),
    }
}

/// Decoded TLS or SSL3 record header, optionally enriched with handshake
/// details when enough bytes were present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRecord {
    /// Record content type (0x16 marks a handshake).
    pub content_type: u8,
    /// Version label derived from the major/minor bytes.
    pub version: &'static str,
    /// Declared record fragment length.
    pub length: u16,
    /// Handshake message type, when present.
    pub handshake_type: Option<u8>,
    /// Human name for the handshake type.
    pub handshake_type_name: Option<&'static str>,
    /// Declared handshake body length (SSL3 decoder only).
    pub handshake_length: Option<u32>,
    /// Sliced handshake body (SSL3 decoder only).
    pub handshake_body: Option<Vec<u8>>,
    /// Offered cipher suite names, in wire order (ClientHello only).
    pub cipher_suites: Option<Vec<String>>,
}

fn tls_version_label(major: u8, minor: u8) -> &'static str {
    if major != 3 {
        return "Unknown";
    }
    match minor {
        1 => "TLS 1.0",
        2 => "TLS 1.1",
        3 => "TLS 1.2",
        4 => "TLS 1.3",
        _ => "Unknown",
    }
}

/// Decode a TLS record.
///
/// Needs at least 5 bytes. ClientHello records additionally get their
/// cipher suite list decoded when the hello body is complete; every other
/// truncation point just yields a less-enriched record.
pub fn parse_tls_record(buf: &[u8]) -> Result<HandshakeRecord> {
    if buf.len() < RECORD_HEADER_LEN {
        return Err(GatewayError::MalformedFrame(format!(
            "TLS record needs {} bytes, have {}",
            RECORD_HEADER_LEN,
            buf.len()
        )));
    }

    let mut record = HandshakeRecord {
        content_type: buf[0],
        version: tls_version_label(buf[1], buf[2]),
        length: u16::from_be_bytes([buf[3], buf[4]]),
        handshake_type: None,
        handshake_type_name: None,
        handshake_length: None,
        handshake_body: None,
        cipher_suites: None,
    };

    if record.content_type != CONTENT_TYPE_HANDSHAKE || buf.len() < 6 {
        return Ok(record);
    }

    let handshake_type = buf[5];
    record.handshake_type = Some(handshake_type);
    record.handshake_type_name = Some(match handshake_type {
        HANDSHAKE_CLIENT_HELLO => "ClientHello",
        HANDSHAKE_SERVER_HELLO => "ServerHello",
        _ => "Other",
    });

    if handshake_type == HANDSHAKE_CLIENT_HELLO {
        record.cipher_suites = decode_client_hello_suites(&buf[6..]);
    }

    Ok(record)
}

/// Walk a ClientHello from the byte after the handshake type:
/// version(2) + random(32) + session id + cipher suites. Returns `None`
/// when any step runs out of bytes.
fn decode_client_hello_suites(body: &[u8]) -> Option<Vec<String>> {
    // client version + random
    let mut pos = 2 + 32;
    let session_id_len = *body.get(pos)? as usize;
    pos = pos + 1 + session_id_len;

    let suites_len =
        u16::from_be_bytes([*body.get(pos)?, *body.get(pos + 1)?]) as usize;
    pos += 2;

    if suites_len % 2 != 0 || pos + suites_len > body.len() {
        return None;
    }

    let suites = body[pos..pos + suites_len]
        .chunks_exact(2)
        .map(|pair| cipher_suite_name(u16::from_be_bytes([pair[0], pair[1]])))
        .collect();
    Some(suites)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a TLS ClientHello record with the given suite codes.
    fn client_hello(suites: &[u16]) -> Vec<u8> {
        let mut buf = vec![0x16, 0x03, 0x03, 0x00, 0x00];
        buf.push(HANDSHAKE_CLIENT_HELLO);
        buf.extend_from_slice(&[0x03, 0x03]); // client version
        buf.extend_from_slice(&[0u8; 32]); // random
        buf.push(0); // empty session id
        buf.extend_from_slice(&((suites.len() * 2) as u16).to_be_bytes());
        for code in suites {
            buf.extend_from_slice(&code.to_be_bytes());
        }
        let fragment_len = (buf.len() - RECORD_HEADER_LEN) as u16;
        buf[3..5].copy_from_slice(&fragment_len.to_be_bytes());
        buf
    }

    #[test]
    fn test_too_short_fails() {
        for len in 0..RECORD_HEADER_LEN {
            assert!(parse_tls_record(&vec![0x16; len]).is_err(), "len {len}");
        }
    }

    #[test]
    fn test_version_labels() {
        let cases = [
            (0x01, "TLS 1.0"),
            (0x02, "TLS 1.1"),
            (0x03, "TLS 1.2"),
            (0x04, "TLS 1.3"),
            (0x09, "Unknown"),
        ];
        for (minor, label) in cases {
            let record = parse_tls_record(&[0x17, 0x03, minor, 0x00, 0x10]).unwrap();
            assert_eq!(record.version, label);
        }
        let record = parse_tls_record(&[0x17, 0x02, 0x01, 0x00, 0x10]).unwrap();
        assert_eq!(record.version, "Unknown");
    }

    #[test]
    fn test_non_handshake_has_no_type() {
        let record = parse_tls_record(&[0x17, 0x03, 0x03, 0x00, 0x08, 0x01]).unwrap();
        assert_eq!(record.handshake_type, None);
        assert_eq!(record.handshake_type_name, None);
    }

    #[test]
    fn test_handshake_type_names() {
        let record = parse_tls_record(&[0x16, 0x03, 0x03, 0x00, 0x04, 0x02]).unwrap();
        assert_eq!(record.handshake_type, Some(0x02));
        assert_eq!(record.handshake_type_name, Some("ServerHello"));

        let record = parse_tls_record(&[0x16, 0x03, 0x03, 0x00, 0x04, 0x0b]).unwrap();
        assert_eq!(record.handshake_type_name, Some("Other"));
    }

    #[test]
    fn test_client_hello_suites_order_and_count() {
        // Two known codes and one unknown, order must be preserved
        let buf = client_hello(&[0x1301, 0xBEEF, 0x002f]);
        let record = parse_tls_record(&buf).unwrap();
        let suites = record.cipher_suites.unwrap();
        assert_eq!(
            suites,
            vec![
                "TLS_AES_128_GCM_SHA256".to_string(),
                "UNKNOWN(0xbeef)".to_string(),
                "TLS_RSA_WITH_AES_128_CBC_SHA".to_string(),
            ]
        );
    }

    #[test]
    fn test_truncated_hello_stops_early_without_failing() {
        let buf = client_hello(&[0x1301, 0x1302]);
        // Cut inside the suites array: still a valid record, no suite list
        for cut in 6..buf.len() {
            let record = parse_tls_record(&buf[..cut]).unwrap();
            if cut < buf.len() {
                assert!(record.cipher_suites.is_none(), "cut {cut}");
            }
            assert_eq!(record.handshake_type_name, Some("ClientHello"));
        }
    }
}
