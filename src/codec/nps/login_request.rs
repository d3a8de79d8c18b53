//! NPS login request message (id 0x0501).
//!
//! Body layout after the 4-byte frame header:
//!
//! ```text
//! 0101        version (1.01)
//! 0000        reserved1
//! 00000121    checksum
//! 0005        usernameLength
//! 61646d696e  username "admin"
//! 0000        reserved2
//! 0100        sessionKeyLength
//! ...         sessionKey (hex-rendered bytes)
//! 0004        gameIdLength
//! 32313736    gameId "2176"
//! fea31c19    reserved3
//! ```

use crate::codec::cursor::{BinaryCursor, FieldKind, FieldSpec};
use crate::error::{GatewayError, Result};

use super::{NpsBody, FRAME_HEADER_LEN};

/// Message id of the login request frame.
pub const MSG_ID_LOGIN_REQUEST: u16 = 0x0501;

/// Decoded login request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequestBody {
    /// Message version field.
    pub version: u16,
    /// Reserved, observed as zero.
    pub reserved1: u16,
    /// Checksum field (not verified by the gateway).
    pub checksum: u32,
    /// Declared username byte length.
    pub username_length: u16,
    /// Username.
    pub username: String,
    /// Reserved, observed as zero.
    pub reserved2: u16,
    /// Declared session key byte length.
    pub session_key_length: u16,
    /// Session key, hex-rendered.
    pub session_key: String,
    /// Declared game id byte length.
    pub game_id_length: u16,
    /// Game identifier.
    pub game_id: String,
    /// Reserved trailer.
    pub reserved3: u32,
}

const LOGIN_REQUEST_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "version",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "reserved1",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "checksum",
        kind: FieldKind::U32,
    },
    FieldSpec {
        name: "username_length",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "username",
        kind: FieldKind::Text {
            length_from: "username_length",
        },
    },
    FieldSpec {
        name: "reserved2",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "session_key_length",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "session_key",
        kind: FieldKind::Hex {
            length_from: "session_key_length",
        },
    },
    FieldSpec {
        name: "game_id_length",
        kind: FieldKind::U16,
    },
    FieldSpec {
        name: "game_id",
        kind: FieldKind::Text {
            length_from: "game_id_length",
        },
    },
    FieldSpec {
        name: "reserved3",
        kind: FieldKind::U32,
    },
];

/// Decode a login request frame body.
///
/// `msg_length` is the declared total frame length from the header; it is
/// checked against the buffer, and the schema walk must then consume the
/// entire buffer. Both checks are independent and both are required, so a
/// frame with trailing garbage fails even when its declared length is
/// satisfied.
pub fn decode_login_request(buf: &[u8], msg_length: u16) -> Result<NpsBody> {
    if buf.len() < msg_length as usize {
        return Err(GatewayError::MalformedFrame(format!(
            "login request: buffer {} shorter than declared length {}",
            buf.len(),
            msg_length
        )));
    }

    let decoded = BinaryCursor::new(buf, FRAME_HEADER_LEN).apply(LOGIN_REQUEST_SCHEMA)?;

    if decoded.offset != buf.len() {
        return Err(GatewayError::MalformedFrame(format!(
            "login request: decoded {} bytes of {}",
            decoded.offset,
            buf.len()
        )));
    }

    Ok(NpsBody::LoginRequest(LoginRequestBody {
        version: decoded.require_u16("version")?,
        reserved1: decoded.require_u16("reserved1")?,
        checksum: decoded.require_u32("checksum")?,
        username_length: decoded.require_u16("username_length")?,
        username: decoded.require_str("username")?,
        reserved2: decoded.require_u16("reserved2")?,
        session_key_length: decoded.require_u16("session_key_length")?,
        session_key: decoded.require_str("session_key")?,
        game_id_length: decoded.require_u16("game_id_length")?,
        game_id: decoded.require_str("game_id")?,
        reserved3: decoded.require_u32("reserved3")?,
    }))
}
