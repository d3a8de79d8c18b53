//! SSL 3.0 record decoding (RFC 6101 framing).
//!
//! Shares the outer record shape with the TLS decoder but differs in two
//! ways: the version map includes SSL 3.0 itself, and the handshake body
//! length is its own 3-byte big-endian field after the handshake type
//! rather than the outer record length.

use crate::error::{GatewayError, Result};

use super::tls::{HandshakeRecord, RECORD_HEADER_LEN};
use super::CONTENT_TYPE_HANDSHAKE;

/// Offset of the 3-byte handshake length: type(1) at 5, length at 6..9.
const HANDSHAKE_BODY_OFFSET: usize = 9;

fn ssl3_handshake_type_name(handshake_type: u8) -> &'static str {
    match handshake_type {
        0x00 => "HelloRequest",
        0x01 => "ClientHello",
        0x02 => "ServerHello",
        0x0b => "Certificate",
        0x0c => "ServerKeyExchange",
        0x0d => "CertificateRequest",
        0x0e => "ServerHelloDone",
        0x0f => "CertificateVerify",
        0x10 => "ClientKeyExchange",
        0x14 => "Finished",
        _ => "Other",
    }
}

fn ssl3_version_label(major: u8, minor: u8) -> &'static str {
    match (major, minor) {
        (3, 0) => "SSL 3.0",
        (3, 1) => "TLS 1.0",
        (3, 2) => "TLS 1.1",
        (3, 3) => "TLS 1.2",
        (3, 4) => "TLS 1.3",
        _ => "Unknown",
    }
}

/// Decode an SSL3 record.
///
/// Needs at least 5 bytes. The handshake sub-header (type + 3-byte
/// length) is decoded when 9 bytes are present, and the body is sliced by
/// the 3-byte length only when it fits inside the buffer.
pub fn parse_ssl3_record(buf: &[u8]) -> Result<HandshakeRecord> {
    if buf.len() < RECORD_HEADER_LEN {
        return Err(GatewayError::MalformedFrame(format!(
            "SSL3 record needs {} bytes, have {}",
            RECORD_HEADER_LEN,
            buf.len()
        )));
    }

    let mut record = HandshakeRecord {
        content_type: buf[0],
        version: ssl3_version_label(buf[1], buf[2]),
        length: u16::from_be_bytes([buf[3], buf[4]]),
        handshake_type: None,
        handshake_type_name: None,
        handshake_length: None,
        handshake_body: None,
        cipher_suites: None,
    };

    if record.content_type == CONTENT_TYPE_HANDSHAKE && buf.len() >= HANDSHAKE_BODY_OFFSET {
        let handshake_type = buf[5];
        record.handshake_type = Some(handshake_type);
        record.handshake_type_name = Some(ssl3_handshake_type_name(handshake_type));

        let handshake_length =
            (u32::from(buf[6]) << 16) | (u32::from(buf[7]) << 8) | u32::from(buf[8]);
        record.handshake_length = Some(handshake_length);

        let end = HANDSHAKE_BODY_OFFSET + handshake_length as usize;
        if end <= buf.len() {
            record.handshake_body = Some(buf[HANDSHAKE_BODY_OFFSET..end].to_vec());
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_fails() {
        for len in 0..RECORD_HEADER_LEN {
            assert!(parse_ssl3_record(&vec![0x16; len]).is_err(), "len {len}");
        }
    }

    #[test]
    fn test_five_tier_version_map() {
        let cases = [
            (0x00, "SSL 3.0"),
            (0x01, "TLS 1.0"),
            (0x02, "TLS 1.1"),
            (0x03, "TLS 1.2"),
            (0x04, "TLS 1.3"),
            (0x07, "Unknown"),
        ];
        for (minor, label) in cases {
            let record = parse_ssl3_record(&[0x15, 0x03, minor, 0x00, 0x02]).unwrap();
            assert_eq!(record.version, label, "minor {minor}");
        }
    }

    #[test]
    fn test_three_byte_handshake_length() {
        // type 0x01, 3-byte length 0x000003, 3-byte body
        let buf = [
            0x16, 0x03, 0x00, 0x00, 0x07, 0x01, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC,
        ];
        let record = parse_ssl3_record(&buf).unwrap();
        assert_eq!(record.handshake_type_name, Some("ClientHello"));
        assert_eq!(record.handshake_length, Some(3));
        assert_eq!(record.handshake_body, Some(vec![0xAA, 0xBB, 0xCC]));
    }

    #[test]
    fn test_declared_body_past_buffer_left_unsliced() {
        let buf = [0x16, 0x03, 0x00, 0x00, 0x07, 0x01, 0x00, 0x00, 0x10, 0xAA];
        let record = parse_ssl3_record(&buf).unwrap();
        assert_eq!(record.handshake_length, Some(16));
        assert!(record.handshake_body.is_none());
    }

    #[test]
    fn test_sub_header_needs_nine_bytes() {
        let buf = [0x16, 0x03, 0x00, 0x00, 0x07, 0x01, 0x00, 0x00];
        let record = parse_ssl3_record(&buf).unwrap();
        assert!(record.handshake_type.is_none());
        assert!(record.handshake_length.is_none());
    }

    #[test]
    fn test_ssl3_type_table() {
        for (byte, name) in [
            (0x00u8, "HelloRequest"),
            (0x02, "ServerHello"),
            (0x0b, "Certificate"),
            (0x14, "Finished"),
            (0x42, "Other"),
        ] {
            let buf = [0x16, 0x03, 0x00, 0x00, 0x04, byte, 0x00, 0x00, 0x00];
            let record = parse_ssl3_record(&buf).unwrap();
            assert_eq!(record.handshake_type_name, Some(name));
        }
    }
}
