//! Protocol classification for inbound byte streams.
//!
//! Every chunk read off a gateway socket is sniffed here before it is
//! routed. Classification is a pure function over the buffer prefix with
//! a fixed precedence order; `Unknown` is a valid, non-error outcome and
//! routes to the broadcast fallback.

mod ssh;

pub use ssh::{parse_ssh_ident, SshIdent};

/// Wire protocols the gateway can distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    /// No known pattern matched.
    Unknown,
    /// Cleartext HTTP/1.x request.
    Http,
    /// SSH identification string.
    Ssh,
    /// SSL 2.0 record (variable-width header).
    Ssl2,
    /// SSL 3.0 record.
    Ssl3,
    /// TLS 1.0-1.3 record.
    Tls,
    /// Proprietary NPS framed message.
    Nps,
}

impl ProtocolKind {
    /// Name used in classification log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Unknown => "Unknown",
            ProtocolKind::Http => "HTTP",
            ProtocolKind::Ssh => "SSH",
            ProtocolKind::Ssl2 => "SSL2",
            ProtocolKind::Ssl3 => "SSL3",
            ProtocolKind::Tls => "TLS",
            ProtocolKind::Nps => "NPS",
        }
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method tokens recognized at the start of a request line.
const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "HEAD", "PUT", "DELETE", "OPTIONS", "PATCH", "CONNECT", "TRACE",
];

/// Classify a raw buffer by inspecting its initial bytes.
///
/// Precedence is first-match-wins and is part of the routing contract:
/// SSL2 (top bit of byte 0) is checked before anything else, so a payload
/// whose later bytes happen to spell an HTTP method still classifies as
/// SSL2; the SSL3 prefix `[0x16, 0x03, 0x00]` wins over the TLS check even
/// though TLS would also accept byte 2 values 1 through 4.
pub fn detect_protocol(buf: &[u8]) -> ProtocolKind {
    // SSL2: record header with the MSB length form
    if buf.len() > 2 && buf[0] & 0x80 != 0 {
        return ProtocolKind::Ssl2;
    }
    // SSL3: handshake content type, version 3.0
    if buf.len() > 3 && buf[0] == 0x16 && buf[1] == 0x03 && buf[2] == 0x00 {
        return ProtocolKind::Ssl3;
    }
    // TLS: handshake content type, version 3.1-3.4
    if buf.len() > 3 && buf[0] == 0x16 && buf[1] == 0x03 && (1..=4).contains(&buf[2]) {
        return ProtocolKind::Tls;
    }
    // HTTP request line: method token followed by a space
    if is_http_request(buf) {
        return ProtocolKind::Http;
    }
    // NPS: length field at offset 2 matches the buffer length exactly
    if buf.len() > 4 {
        let declared = i16::from_be_bytes([buf[2], buf[3]]);
        if i32::from(declared) == buf.len() as i32 {
            return ProtocolKind::Nps;
        }
    }
    // SSH identification string
    if buf.starts_with(b"SSH-") {
        return ProtocolKind::Ssh;
    }
    ProtocolKind::Unknown
}

fn is_http_request(buf: &[u8]) -> bool {
    HTTP_METHODS.iter().any(|method| {
        let token = method.as_bytes();
        buf.len() > token.len()
            && buf.starts_with(token)
            && buf[token.len()] == b' '
    })
}
