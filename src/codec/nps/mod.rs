//! NPS framed-message decoding.
//!
//! Every frame carries a 4-byte header: message id (u16 BE) then declared
//! total frame length (u16 BE, header included). The body decoder is
//! chosen from a static id table; ids without a registered decoder fall
//! back to an opaque raw body so unknown traffic still surfaces in logs.

mod login_request;

pub use login_request::{decode_login_request, LoginRequestBody, MSG_ID_LOGIN_REQUEST};

use crate::error::{GatewayError, Result};

/// Frame header length: u16 id + u16 declared total length.
pub const FRAME_HEADER_LEN: usize = 4;

/// A decoded NPS frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpsMessage {
    /// Message id from the header.
    pub msg_id: u16,
    /// Declared total frame length from the header.
    pub msg_length: u16,
    /// Typed body when a decoder is registered, opaque bytes otherwise.
    pub body: NpsBody,
}

/// Body variants of an NPS frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpsBody {
    /// Login request (id 0x0501).
    LoginRequest(LoginRequestBody),
    /// No decoder registered for this id; bytes [4, msg_length).
    Unknown(Vec<u8>),
}

impl NpsMessage {
    /// Label used in log records: the known message name, or
    /// `unknown(id)` for unregistered ids.
    pub fn kind_label(&self) -> String {
        match self.body {
            NpsBody::LoginRequest(_) => "LoginRequest".to_string(),
            NpsBody::Unknown(_) => format!("unknown({:#06x})", self.msg_id),
        }
    }
}

/// A registered body decoder: full frame bytes plus the declared length.
type BodyDecoder = fn(&[u8], u16) -> Result<NpsBody>;

/// Static id table. Order is irrelevant for lookup; the raw fallback is
/// the explicit default for ids not listed here.
const MESSAGE_DECODERS: &[(u16, BodyDecoder)] = &[(MSG_ID_LOGIN_REQUEST, decode_login_request)];

/// Parse an NPS frame.
///
/// The header needs 4 bytes; anything shorter is a malformed frame. The
/// registered decoder for the id is applied when present, and each typed
/// decoder enforces full-buffer consumption on top of the declared-length
/// check. Unregistered ids decode to [`NpsBody::Unknown`].
pub fn parse_nps_message(buf: &[u8]) -> Result<NpsMessage> {
    if buf.len() < FRAME_HEADER_LEN {
        return Err(GatewayError::MalformedFrame(format!(
            "NPS frame header needs {} bytes, have {}",
            FRAME_HEADER_LEN,
            buf.len()
        )));
    }

    let msg_id = u16::from_be_bytes([buf[0], buf[1]]);
    let msg_length = u16::from_be_bytes([buf[2], buf[3]]);

    let decoder = MESSAGE_DECODERS
        .iter()
        .find(|(id, _)| *id == msg_id)
        .map(|(_, decoder)| *decoder);

    let body = match decoder {
        Some(decode) => decode(buf, msg_length)?,
        None => NpsBody::Unknown(raw_body(buf, msg_length)),
    };

    Ok(NpsMessage {
        msg_id,
        msg_length,
        body,
    })
}

/// Slice bytes [4, msg_length) as an opaque body, clamped to the buffer.
fn raw_body(buf: &[u8], msg_length: u16) -> Vec<u8> {
    let end = (msg_length as usize).min(buf.len());
    buf.get(FRAME_HEADER_LEN..end).unwrap_or(&[]).to_vec()
}
