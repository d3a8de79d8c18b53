//! HTTP reverse-proxy bridge.
//!
//! A gateway port is not an HTTP server, but legacy clients send plain
//! HTTP requests to it. The bridge reconstructs the request from the raw
//! socket bytes, replays it against the loopback backend application, and
//! writes the backend's response back onto the originating socket
//! byte-for-byte. No timeout is imposed on the upstream round trip;
//! adding one is a known hardening improvement.

use std::collections::HashMap;

use reqwest::Client;

use crate::error::{GatewayError, Result};

/// A cleartext HTTP request reassembled from raw socket bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHttpRequest {
    /// Request method token.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Headers with lower-cased names.
    pub headers: HashMap<String, String>,
    /// Body bytes following the blank-line terminator, if any.
    pub body: Option<Vec<u8>>,
}

/// Split a raw buffer into request line, headers, and body.
///
/// Header names are lower-cased; values keep embedded colons. The body is
/// whatever follows the first `\r\n\r\n`, when at least one byte does.
pub fn parse_raw_request(buf: &[u8]) -> RawHttpRequest {
    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split("\r\n").flat_map(|l| l.split('\n'));

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let method = parts.next().filter(|m| !m.is_empty()).unwrap_or("GET");
    let path = parts.next().filter(|p| !p.is_empty()).unwrap_or("/");

    let mut headers = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let body = find_header_end(buf).and_then(|end| {
        if end < buf.len() {
            Some(buf[end..].to_vec())
        } else {
            None
        }
    });

    RawHttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        headers,
        body,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

/// Forwards reconstructed requests to the loopback backend.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: Client,
    backend_port: u16,
}

impl HttpBridge {
    /// Create a bridge targeting `127.0.0.1:backend_port`.
    pub fn new(backend_port: u16) -> Self {
        Self {
            client: Client::new(),
            backend_port,
        }
    }

    /// The loopback port requests are forwarded to.
    pub fn backend_port(&self) -> u16 {
        self.backend_port
    }

    /// Forward one raw request and return the literal response bytes to
    /// write back: status line, every header re-emitted once per value,
    /// blank line, body.
    pub async fn forward(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let request = parse_raw_request(raw);
        let url = format!("http://127.0.0.1:{}{}", self.backend_port, request.path);

        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| GatewayError::Upstream(format!("bad method {}: {e}", request.method)))?;

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let mut out = Vec::new();
        out.extend_from_slice(
            format!(
                "{} {} {}\r\n",
                version_label(response.version()),
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );
        // HeaderMap iteration repeats the name for each value of a
        // multi-valued header, which is exactly the re-emission rule
        for (name, value) in response.headers() {
            out.extend_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");

        let body = response.bytes().await?;
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn version_label(version: http::Version) -> &'static str {
    if version == http::Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == http::Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == http::Version::HTTP_2 {
        "HTTP/2"
    } else if version == http::Version::HTTP_3 {
        "HTTP/3"
    } else {
        "HTTP/1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line_and_headers() {
        let raw = b"GET /AuthLogin?username=admin HTTP/1.1\r\nHost: example.com\r\nX-Game: mco\r\n\r\n";
        let request = parse_raw_request(raw);
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/AuthLogin?username=admin");
        assert_eq!(request.headers.get("host").map(String::as_str), Some("example.com"));
        assert_eq!(request.headers.get("x-game").map(String::as_str), Some("mco"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_header_names_lowercased_values_keep_colons() {
        let raw = b"GET / HTTP/1.1\r\nX-Upstream: http://10.0.0.1:8226\r\n\r\n";
        let request = parse_raw_request(raw);
        assert_eq!(
            request.headers.get("x-upstream").map(String::as_str),
            Some("http://10.0.0.1:8226")
        );
    }

    #[test]
    fn test_body_sliced_after_blank_line() {
        let raw = b"POST /data HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let request = parse_raw_request(raw);
        assert_eq!(request.method, "POST");
        assert_eq!(request.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_no_body_when_nothing_follows_terminator() {
        let raw = b"GET / HTTP/1.1\r\n\r\n";
        let request = parse_raw_request(raw);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_empty_buffer_defaults() {
        let request = parse_raw_request(b"");
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/");
        assert!(request.headers.is_empty());
    }
}
