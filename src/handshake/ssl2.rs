//! SSL 2.0 record decoding.
//!
//! SSL2 predates the TLS record layer: the header is 2 or 3 bytes wide
//! depending on the top bit of the first byte, the length field straddles
//! the header bytes, and the message type byte selects one of eight body
//! layouts. The gateway decodes all of them for diagnostics; truncated
//! bodies fail the decode rather than producing partial records.

use phf::phf_map;

use crate::error::{GatewayError, Result};

/// Minimum buffer length to read the record header.
pub const MIN_RECORD_LEN: usize = 3;

/// SSL2 cipher kind names by 3-byte code.
static SSL2_CIPHER_KINDS: phf::Map<u32, &'static str> = phf_map! {
    0x010080u32 => "SSL_CK_RC4_128_WITH_MD5",
    0x020080u32 => "SSL_CK_RC4_128_EXPORT40_WITH_MD5",
    0x030080u32 => "SSL_CK_RC2_128_CBC_WITH_MD5",
    0x040080u32 => "SSL_CK_RC2_128_CBC_EXPORT40_WITH_MD5",
    0x050080u32 => "SSL_CK_IDEA_128_CBC_WITH_MD5",
    0x060040u32 => "SSL_CK_DES_64_CBC_WITH_MD5",
    0x0700c0u32 => "SSL_CK_DES_192_EDE3_CBC_WITH_MD5",
};

/// Resolve a 3-byte cipher-spec code, unknown codes keep their hex.
pub fn cipher_kind_name(code: u32) -> String {
    match SSL2_CIPHER_KINDS.get(&code) {
        Some(name) => (*name).to_string(),
        None => format!("UNKNOWN(0x{code:06x})"),
    }
}

/// Message type bytes, per the SSL2 draft.
mod msg_type {
    pub const ERROR: u8 = 0;
    pub const CLIENT_HELLO: u8 = 1;
    pub const CLIENT_MASTER_KEY: u8 = 2;
    pub const CLIENT_FINISHED: u8 = 3;
    pub const SERVER_HELLO: u8 = 4;
    pub const SERVER_VERIFY: u8 = 5;
    pub const SERVER_FINISHED: u8 = 6;
    pub const REQUEST_CERTIFICATE: u8 = 7;
    pub const CLIENT_CERTIFICATE: u8 = 8;
}

fn msg_type_name(value: u8) -> &'static str {
    match value {
        msg_type::ERROR => "Error",
        msg_type::CLIENT_HELLO => "ClientHello",
        msg_type::CLIENT_MASTER_KEY => "ClientMasterKey",
        msg_type::CLIENT_FINISHED => "ClientFinished",
        msg_type::SERVER_HELLO => "ServerHello",
        msg_type::SERVER_VERIFY => "ServerVerify",
        msg_type::SERVER_FINISHED => "ServerFinished",
        msg_type::REQUEST_CERTIFICATE => "RequestCertificate",
        msg_type::CLIENT_CERTIFICATE => "ClientCertificate",
        _ => "Other",
    }
}

/// Decoded SSL2 record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssl2Record {
    /// Record length from the variable-width header.
    pub record_length: u16,
    /// Message type byte.
    pub msg_type: u8,
    /// Human name for the message type.
    pub msg_type_name: &'static str,
    /// Version major byte (hello messages only).
    pub version_major: Option<u8>,
    /// Version minor byte (hello messages only).
    pub version_minor: Option<u8>,
    /// Version label (hello messages only).
    pub version: Option<&'static str>,
    /// Decoded message body.
    pub body: Ssl2Body,
}

/// Per-message-type body variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ssl2Body {
    /// Client hello: offered cipher specs, session id, challenge.
    ClientHello {
        /// Cipher spec names in wire order.
        cipher_specs: Vec<String>,
        /// Session id bytes.
        session_id: Vec<u8>,
        /// Challenge bytes.
        challenge: Vec<u8>,
    },
    /// Server hello: accepted specs, certificate, connection id.
    ServerHello {
        /// Whether the client's session id was found in the cache.
        session_id_hit: bool,
        /// Certificate type byte.
        certificate_type: u8,
        /// Cipher spec names in wire order.
        cipher_specs: Vec<String>,
        /// Certificate bytes.
        certificate: Vec<u8>,
        /// Connection id bytes.
        connection_id: Vec<u8>,
    },
    /// Client master key: chosen kind plus key material.
    ClientMasterKey {
        /// Chosen cipher kind name.
        cipher_kind: String,
        /// Cleartext key portion.
        clear_key: Vec<u8>,
        /// Encrypted key portion.
        encrypted_key: Vec<u8>,
        /// Key argument (IV) bytes.
        key_arg: Vec<u8>,
    },
    /// Client finished: the connection id echoed back.
    ClientFinished {
        /// Connection id bytes.
        connection_id: Vec<u8>,
    },
    /// Server verify: the challenge echoed back.
    ServerVerify {
        /// Challenge bytes.
        challenge: Vec<u8>,
    },
    /// Server finished: the new session id.
    ServerFinished {
        /// Session id bytes.
        session_id: Vec<u8>,
    },
    /// Certificate request.
    RequestCertificate {
        /// Authentication type byte.
        auth_type: u8,
        /// Challenge bytes.
        challenge: Vec<u8>,
    },
    /// Client certificate response.
    ClientCertificate {
        /// Certificate type byte.
        certificate_type: u8,
        /// Certificate bytes.
        certificate: Vec<u8>,
        /// Response (signature) bytes.
        response: Vec<u8>,
    },
    /// Error record with its 2-byte code.
    Error {
        /// Error code.
        error_code: u16,
    },
    /// Unrecognized message type; raw body bytes.
    Raw(Vec<u8>),
}

/// Decode an SSL2 record.
///
/// The header is 2 bytes when the top bit of byte 0 is set
/// (`record_length = ((b0 & 0x7F) << 8) | b1`), otherwise 3 bytes
/// (`record_length = ((b0 & 0x3F) << 8) | b1`, byte 2 is the padding
/// length and is ignored here). The declared body, `record_length - 1`
/// bytes after the message type, must be fully present.
pub fn parse_ssl2_record(buf: &[u8]) -> Result<Ssl2Record> {
    if buf.len() < MIN_RECORD_LEN {
        return Err(GatewayError::MalformedFrame(format!(
            "SSL2 record needs {} bytes, have {}",
            MIN_RECORD_LEN,
            buf.len()
        )));
    }

    let (header_len, record_length) = if buf[0] & 0x80 != 0 {
        (2usize, ((u16::from(buf[0]) & 0x7F) << 8) | u16::from(buf[1]))
    } else {
        (3usize, ((u16::from(buf[0]) & 0x3F) << 8) | u16::from(buf[1]))
    };

    if record_length == 0 {
        return Err(GatewayError::MalformedFrame(
            "SSL2 record length is zero".to_string(),
        ));
    }
    let Some(&msg_type_byte) = buf.get(header_len) else {
        return Err(GatewayError::MalformedFrame(
            "SSL2 record truncated before message type".to_string(),
        ));
    };

    // record_length counts the message type byte plus the body
    let body_len = record_length as usize - 1;
    let body_start = header_len + 1;
    let body_end = body_start
        .checked_add(body_len)
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| {
            GatewayError::MalformedFrame(format!(
                "SSL2 body truncated: declared {} bytes, have {}",
                body_len,
                buf.len().saturating_sub(body_start)
            ))
        })?;
    let body = &buf[body_start..body_end];

    let is_hello =
        msg_type_byte == msg_type::CLIENT_HELLO || msg_type_byte == msg_type::SERVER_HELLO;
    let (version_major, version_minor, version) = if is_hello && body.len() >= 2 {
        let label = match (body[0], body[1]) {
            (2, 0) => "SSL 2.0",
            (3, 0) => "SSL 3.0",
            _ => "Unknown",
        };
        (Some(body[0]), Some(body[1]), Some(label))
    } else {
        (None, None, None)
    };

    let decoded_body = match msg_type_byte {
        msg_type::ERROR => decode_error(body)?,
        msg_type::CLIENT_HELLO => decode_client_hello(body)?,
        msg_type::CLIENT_MASTER_KEY => decode_client_master_key(body)?,
        msg_type::CLIENT_FINISHED => Ssl2Body::ClientFinished {
            connection_id: body.to_vec(),
        },
        msg_type::SERVER_HELLO => decode_server_hello(body)?,
        msg_type::SERVER_VERIFY => Ssl2Body::ServerVerify {
            challenge: body.to_vec(),
        },
        msg_type::SERVER_FINISHED => Ssl2Body::ServerFinished {
            session_id: body.to_vec(),
        },
        msg_type::REQUEST_CERTIFICATE => decode_request_certificate(body)?,
        msg_type::CLIENT_CERTIFICATE => decode_client_certificate(body)?,
        _ => Ssl2Body::Raw(body.to_vec()),
    };

    Ok(Ssl2Record {
        record_length,
        msg_type: msg_type_byte,
        msg_type_name: msg_type_name(msg_type_byte),
        version_major,
        version_minor,
        version,
        body: decoded_body,
    })
}

/// Bounds-checked reader over one SSL2 message body.
struct BodyReader<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self { body, pos: 0 }
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        let b = self.bytes(1, what)?;
        Ok(b[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self, what: &str) -> Result<u32> {
        let b = self.bytes(3, what)?;
        Ok((u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]))
    }

    fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.body.len() {
            return Err(GatewayError::MalformedFrame(format!(
                "SSL2 body truncated in {what}: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.body.len()
            )));
        }
        let out = &self.body[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Decode a run of 3-byte cipher-spec codes.
    fn cipher_specs(&mut self, byte_len: usize, what: &str) -> Result<Vec<String>> {
        if byte_len % 3 != 0 {
            return Err(GatewayError::MalformedFrame(format!(
                "SSL2 {what} length {byte_len} is not a multiple of 3"
            )));
        }
        let raw = self.bytes(byte_len, what)?;
        Ok(raw
            .chunks_exact(3)
            .map(|c| {
                cipher_kind_name((u32::from(c[0]) << 16) | (u32::from(c[1]) << 8) | u32::from(c[2]))
            })
            .collect())
    }
}

fn decode_error(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    Ok(Ssl2Body::Error {
        error_code: r.u16("error code")?,
    })
}

fn decode_client_hello(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    let _version = r.u16("client hello version")?;
    let specs_len = r.u16("cipher specs length")? as usize;
    let session_id_len = r.u16("session id length")? as usize;
    let challenge_len = r.u16("challenge length")? as usize;
    let cipher_specs = r.cipher_specs(specs_len, "cipher specs")?;
    let session_id = r.bytes(session_id_len, "session id")?.to_vec();
    let challenge = r.bytes(challenge_len, "challenge")?.to_vec();
    Ok(Ssl2Body::ClientHello {
        cipher_specs,
        session_id,
        challenge,
    })
}

fn decode_server_hello(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    let _version = r.u16("server hello version")?;
    let session_id_hit = r.u8("session id hit")? != 0;
    let certificate_type = r.u8("certificate type")?;
    let cert_len = r.u16("certificate length")? as usize;
    let specs_len = r.u16("cipher specs length")? as usize;
    let conn_id_len = r.u16("connection id length")? as usize;
    let certificate = r.bytes(cert_len, "certificate")?.to_vec();
    let cipher_specs = r.cipher_specs(specs_len, "cipher specs")?;
    let connection_id = r.bytes(conn_id_len, "connection id")?.to_vec();
    Ok(Ssl2Body::ServerHello {
        session_id_hit,
        certificate_type,
        cipher_specs,
        certificate,
        connection_id,
    })
}

fn decode_client_master_key(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    let cipher_kind = cipher_kind_name(r.u24("cipher kind")?);
    let clear_len = r.u16("clear key length")? as usize;
    let encrypted_len = r.u16("encrypted key length")? as usize;
    let key_arg_len = r.u16("key arg length")? as usize;
    let clear_key = r.bytes(clear_len, "clear key")?.to_vec();
    let encrypted_key = r.bytes(encrypted_len, "encrypted key")?.to_vec();
    let key_arg = r.bytes(key_arg_len, "key arg")?.to_vec();
    Ok(Ssl2Body::ClientMasterKey {
        cipher_kind,
        clear_key,
        encrypted_key,
        key_arg,
    })
}

fn decode_request_certificate(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    let auth_type = r.u8("auth type")?;
    let challenge = body[r.pos..].to_vec();
    Ok(Ssl2Body::RequestCertificate {
        auth_type,
        challenge,
    })
}

fn decode_client_certificate(body: &[u8]) -> Result<Ssl2Body> {
    let mut r = BodyReader::new(body);
    let certificate_type = r.u8("certificate type")?;
    let cert_len = r.u16("certificate length")? as usize;
    let response_len = r.u16("response length")? as usize;
    let certificate = r.bytes(cert_len, "certificate")?.to_vec();
    let response = r.bytes(response_len, "response")?.to_vec();
    Ok(Ssl2Body::ClientCertificate {
        certificate_type,
        certificate,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a 2-byte-header record around a message type and body.
    fn record_2byte(msg_type_byte: u8, body: &[u8]) -> Vec<u8> {
        let record_length = (1 + body.len()) as u16;
        let mut buf = vec![0x80 | (record_length >> 8) as u8, record_length as u8];
        buf.push(msg_type_byte);
        buf.extend_from_slice(body);
        buf
    }

    fn client_hello_body(specs: &[u32], session_id: &[u8], challenge: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x00, 0x02]); // version 0.2 (SSL2 wire order)
        body.extend_from_slice(&((specs.len() * 3) as u16).to_be_bytes());
        body.extend_from_slice(&(session_id.len() as u16).to_be_bytes());
        body.extend_from_slice(&(challenge.len() as u16).to_be_bytes());
        for code in specs {
            body.extend_from_slice(&[(code >> 16) as u8, (code >> 8) as u8, *code as u8]);
        }
        body.extend_from_slice(session_id);
        body.extend_from_slice(challenge);
        body
    }

    #[test]
    fn test_too_short_fails() {
        assert!(parse_ssl2_record(&[]).is_err());
        assert!(parse_ssl2_record(&[0x80]).is_err());
        assert!(parse_ssl2_record(&[0x80, 0x01]).is_err());
    }

    #[test]
    fn test_two_byte_header_arithmetic() {
        // [0x81, 0x02]: MSB set, record_length = ((0x81 & 0x7F) << 8) | 0x02 = 258
        let mut buf = vec![0x81, 0x02, msg_type::SERVER_VERIFY];
        buf.extend_from_slice(&vec![0xAB; 257]);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(record.record_length, 258);
        assert_eq!(record.msg_type_name, "ServerVerify");
    }

    #[test]
    fn test_three_byte_header_arithmetic() {
        // [0x01, 0x02, 0x00]: MSB clear, record_length = ((0x01 & 0x3F) << 8) | 0x02 = 258,
        // third byte is the padding length and is ignored
        let mut buf = vec![0x01, 0x02, 0x00, msg_type::SERVER_VERIFY];
        buf.extend_from_slice(&vec![0xCD; 257]);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(record.record_length, 258);
    }

    #[test]
    fn test_client_hello_round_trip() {
        let body = client_hello_body(&[0x010080, 0xABCDEF], b"sess", b"challenge");
        let buf = record_2byte(msg_type::CLIENT_HELLO, &body);
        let record = parse_ssl2_record(&buf).unwrap();

        assert_eq!(record.msg_type_name, "ClientHello");
        assert_eq!(record.version_major, Some(0x00));
        assert_eq!(record.version_minor, Some(0x02));
        match record.body {
            Ssl2Body::ClientHello {
                cipher_specs,
                session_id,
                challenge,
            } => {
                assert_eq!(
                    cipher_specs,
                    vec![
                        "SSL_CK_RC4_128_WITH_MD5".to_string(),
                        "UNKNOWN(0xabcdef)".to_string(),
                    ]
                );
                assert_eq!(session_id, b"sess");
                assert_eq!(challenge, b"challenge");
            }
            other => panic!("expected client hello, got {other:?}"),
        }
    }

    #[test]
    fn test_hello_version_label() {
        let mut body = client_hello_body(&[], &[], &[]);
        body[0] = 2;
        body[1] = 0;
        let record = parse_ssl2_record(&record_2byte(msg_type::CLIENT_HELLO, &body)).unwrap();
        assert_eq!(record.version, Some("SSL 2.0"));

        body[0] = 3;
        let record = parse_ssl2_record(&record_2byte(msg_type::CLIENT_HELLO, &body)).unwrap();
        assert_eq!(record.version, Some("SSL 3.0"));
    }

    #[test]
    fn test_non_hello_has_no_version() {
        let buf = record_2byte(msg_type::CLIENT_FINISHED, b"conn");
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(record.version, None);
        assert_eq!(
            record.body,
            Ssl2Body::ClientFinished {
                connection_id: b"conn".to_vec()
            }
        );
    }

    #[test]
    fn test_truncated_client_hello_fails() {
        let body = client_hello_body(&[0x010080], b"id", b"ch");
        let buf = record_2byte(msg_type::CLIENT_HELLO, &body);
        // Remove trailing bytes but keep the declared record length
        let mut truncated = buf.clone();
        truncated.truncate(buf.len() - 2);
        assert!(parse_ssl2_record(&truncated).is_err());
    }

    #[test]
    fn test_cipher_specs_length_must_be_multiple_of_three() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x00, 0x02]);
        body.extend_from_slice(&4u16.to_be_bytes()); // not divisible by 3
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&[0, 0, 0, 0]);
        let buf = record_2byte(msg_type::CLIENT_HELLO, &body);
        assert!(parse_ssl2_record(&buf).is_err());
    }

    #[test]
    fn test_server_hello() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x00, 0x02]); // version
        body.push(1); // session id hit
        body.push(1); // certificate type
        body.extend_from_slice(&3u16.to_be_bytes()); // cert len
        body.extend_from_slice(&3u16.to_be_bytes()); // specs len
        body.extend_from_slice(&2u16.to_be_bytes()); // conn id len
        body.extend_from_slice(&[0xDE, 0xAD, 0xBF]); // cert
        body.extend_from_slice(&[0x07, 0x00, 0xC0]); // 3DES spec
        body.extend_from_slice(&[0x11, 0x22]); // conn id
        let buf = record_2byte(msg_type::SERVER_HELLO, &body);
        let record = parse_ssl2_record(&buf).unwrap();
        match record.body {
            Ssl2Body::ServerHello {
                session_id_hit,
                certificate_type,
                cipher_specs,
                certificate,
                connection_id,
            } => {
                assert!(session_id_hit);
                assert_eq!(certificate_type, 1);
                assert_eq!(cipher_specs, vec!["SSL_CK_DES_192_EDE3_CBC_WITH_MD5"]);
                assert_eq!(certificate, vec![0xDE, 0xAD, 0xBF]);
                assert_eq!(connection_id, vec![0x11, 0x22]);
            }
            other => panic!("expected server hello, got {other:?}"),
        }
    }

    #[test]
    fn test_client_master_key() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x01, 0x00, 0x80]); // RC4_128
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&3u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0xAA, 0xBB]);
        body.extend_from_slice(&[0x01, 0x02, 0x03]);
        body.push(0xFF);
        let buf = record_2byte(msg_type::CLIENT_MASTER_KEY, &body);
        let record = parse_ssl2_record(&buf).unwrap();
        match record.body {
            Ssl2Body::ClientMasterKey {
                cipher_kind,
                clear_key,
                encrypted_key,
                key_arg,
            } => {
                assert_eq!(cipher_kind, "SSL_CK_RC4_128_WITH_MD5");
                assert_eq!(clear_key, vec![0xAA, 0xBB]);
                assert_eq!(encrypted_key, vec![0x01, 0x02, 0x03]);
                assert_eq!(key_arg, vec![0xFF]);
            }
            other => panic!("expected client master key, got {other:?}"),
        }
    }

    #[test]
    fn test_error_record() {
        let buf = record_2byte(msg_type::ERROR, &[0x00, 0x04]);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(record.msg_type_name, "Error");
        assert_eq!(record.body, Ssl2Body::Error { error_code: 4 });
    }

    #[test]
    fn test_unrecognized_type_keeps_raw_body() {
        let buf = record_2byte(0x2A, &[0x01, 0x02]);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(record.msg_type_name, "Other");
        assert_eq!(record.body, Ssl2Body::Raw(vec![0x01, 0x02]));
    }

    #[test]
    fn test_declared_body_past_buffer_fails() {
        // Header says 10 bytes of record but only the type byte follows
        let buf = [0x80, 0x0A, msg_type::CLIENT_FINISHED];
        assert!(parse_ssl2_record(&buf).is_err());
    }

    #[test]
    fn test_request_certificate() {
        let buf = record_2byte(msg_type::REQUEST_CERTIFICATE, &[0x01, 0xCA, 0xFE]);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(
            record.body,
            Ssl2Body::RequestCertificate {
                auth_type: 1,
                challenge: vec![0xCA, 0xFE],
            }
        );
    }

    #[test]
    fn test_client_certificate() {
        let mut body = vec![0x01];
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0xC0, 0xDE]);
        body.push(0x5A);
        let buf = record_2byte(msg_type::CLIENT_CERTIFICATE, &body);
        let record = parse_ssl2_record(&buf).unwrap();
        assert_eq!(
            record.body,
            Ssl2Body::ClientCertificate {
                certificate_type: 1,
                certificate: vec![0xC0, 0xDE],
                response: vec![0x5A],
            }
        );
    }
}
