//! SSH identification string parsing (RFC 4253 section 4.2).
//!
//! The gateway never speaks SSH; this only enriches the classification
//! log for connections that open with an identification string.

/// Parsed SSH identification line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshIdent {
    /// Full identification token, e.g. `SSH-2.0-OpenSSH_8.2p1`.
    pub protocol_version: String,
    /// Software version portion, if present.
    pub software_version: Option<String>,
    /// Trailing comments, if present.
    pub comments: Option<String>,
}

/// Parse an `SSH-protoversion-softwareversion [comments]` line.
///
/// Returns `None` when the buffer does not start with `SSH-`.
pub fn parse_ssh_ident(buf: &[u8]) -> Option<SshIdent> {
    if !buf.starts_with(b"SSH-") {
        return None;
    }
    let ascii = String::from_utf8_lossy(buf);
    let line = ascii
        .split("\r\n")
        .next()
        .and_then(|l| l.split('\n').next())
        .unwrap_or(&ascii);

    let mut words = line.split(' ');
    let ident = words.next().unwrap_or_default();
    let comments = {
        let rest = words.collect::<Vec<_>>().join(" ");
        if rest.is_empty() { None } else { Some(rest) }
    };
    // ident is "SSH-<proto>-<software>"; the software part may itself
    // contain dashes, so only split twice
    let software_version = ident.splitn(3, '-').nth(2).map(str::to_string);

    Some(SshIdent {
        protocol_version: ident.to_string(),
        software_version,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_ident() {
        let ident =
            parse_ssh_ident(b"SSH-2.0-OpenSSH_8.2p1 Ubuntu-4ubuntu0.3\r\n").unwrap();
        assert_eq!(ident.protocol_version, "SSH-2.0-OpenSSH_8.2p1");
        assert_eq!(ident.software_version.as_deref(), Some("OpenSSH_8.2p1"));
        assert_eq!(ident.comments.as_deref(), Some("Ubuntu-4ubuntu0.3"));
    }

    #[test]
    fn test_parses_ident_without_comments() {
        let ident = parse_ssh_ident(b"SSH-2.0-x\r\n").unwrap();
        assert_eq!(ident.protocol_version, "SSH-2.0-x");
        assert_eq!(ident.software_version.as_deref(), Some("x"));
        assert!(ident.comments.is_none());
    }

    #[test]
    fn test_rejects_non_ssh() {
        assert!(parse_ssh_ident(b"GET / HTTP/1.1").is_none());
    }
}
