//! NPS message-handler seam.
//!
//! Business logic for the framed protocol lives outside this crate. The
//! dispatcher hands every decoded frame to an [`NpsHandler`] and acts on
//! the outcome: a payload is written back on the originating socket, an
//! error is logged, and `None` means no response is owed.

use bytes::Bytes;

use crate::codec::NpsMessage;
use crate::error::Result;

/// A decoded frame plus its origin, as presented to the handler.
#[derive(Debug, Clone)]
pub struct NpsEnvelope {
    /// Originating session id (`ip:port`).
    pub session_id: String,
    /// Raw frame bytes as read off the socket.
    pub payload: Bytes,
    /// Decoded message.
    pub message: NpsMessage,
}

/// External collaborator processing NPS frames.
///
/// The handler runs to completion before the session's next chunk is
/// processed; other sessions are unaffected. No timeout is imposed on the
/// call.
pub trait NpsHandler: Send + Sync {
    /// Process one frame, optionally returning response bytes for the
    /// originating socket.
    fn handle(&self, envelope: &NpsEnvelope) -> Result<Option<Bytes>>;
}

/// Default handler: echo the raw payload back for any well-formed frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl NpsHandler for EchoHandler {
    fn handle(&self, envelope: &NpsEnvelope) -> Result<Option<Bytes>> {
        Ok(Some(envelope.payload.clone()))
    }
}
