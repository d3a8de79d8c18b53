//! Per-chunk routing.
//!
//! Each read event off a session socket is treated as one complete
//! application-level message, as the legacy suite did; there is no
//! reassembly across reads. The chunk is classified and routed: HTTP to
//! the bridge, NPS to the message handler, everything else to a
//! classification log plus a broadcast to every other tracked session.

use std::sync::Arc;

use bytes::Bytes;

use crate::bridge::HttpBridge;
use crate::classify::{detect_protocol, parse_ssh_ident, ProtocolKind};
use crate::codec::{parse_nps_message, to_hex};
use crate::error::Result;
use crate::handshake::{parse_ssl2_record, parse_ssl3_record, parse_tls_record};

use super::handler::{NpsEnvelope, NpsHandler};
use super::session::{Session, SessionRegistry};

/// Routes classified chunks for all sessions.
pub struct Dispatcher {
    registry: SessionRegistry,
    bridge: HttpBridge,
    handler: Arc<dyn NpsHandler>,
}

impl Dispatcher {
    /// Build a dispatcher over a shared registry.
    pub fn new(registry: SessionRegistry, bridge: HttpBridge, handler: Arc<dyn NpsHandler>) -> Self {
        Self {
            registry,
            bridge,
            handler,
        }
    }

    /// The shared session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Process one inbound chunk for `session`.
    ///
    /// An `Err` return means the session must be torn down (transport or
    /// upstream failure); decode failures are logged and swallowed here
    /// because they are terminal only to the single chunk.
    pub async fn handle_chunk(&self, session: &Arc<Session>, chunk: &[u8]) -> Result<()> {
        let kind = detect_protocol(chunk);

        match kind {
            ProtocolKind::Http => self.forward_http(session, chunk).await,
            ProtocolKind::Nps => self.dispatch_nps(session, chunk).await,
            _ => {
                self.log_classified(session, kind, chunk);
                self.broadcast(session, chunk).await;
                Ok(())
            }
        }
    }

    async fn forward_http(&self, session: &Arc<Session>, chunk: &[u8]) -> Result<()> {
        match self.bridge.forward(chunk).await {
            Ok(response) => {
                session.write(&response).await?;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    session = session.id(),
                    backend_port = self.bridge.backend_port(),
                    error = %e,
                    "backend forward error"
                );
                Err(e)
            }
        }
    }

    async fn dispatch_nps(&self, session: &Arc<Session>, chunk: &[u8]) -> Result<()> {
        let message = match parse_nps_message(chunk) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    session = session.id(),
                    port = session.port(),
                    error = %e,
                    "dropping malformed NPS frame"
                );
                return Ok(());
            }
        };

        let envelope = NpsEnvelope {
            session_id: session.id().to_string(),
            payload: Bytes::copy_from_slice(chunk),
            message,
        };
        let label = envelope.message.kind_label();

        match self.handler.handle(&envelope) {
            Ok(Some(response)) => {
                session.write(&response).await?;
                tracing::info!(session = session.id(), kind = %label, "NPS response written");
            }
            Ok(None) => {
                tracing::info!(session = session.id(), kind = %label, "NPS message handled, no response");
            }
            Err(e) => {
                tracing::error!(session = session.id(), kind = %label, error = %e, "NPS handler error");
            }
        }
        Ok(())
    }

    /// Emit the classification record for traffic headed to the
    /// broadcast fallback, enriched with whatever the protocol-specific
    /// decoder can extract.
    fn log_classified(&self, session: &Arc<Session>, kind: ProtocolKind, chunk: &[u8]) {
        tracing::info!(
            session = session.id(),
            port = session.port(),
            protocol = %kind,
            payload_hex = %to_hex(chunk),
            payload_ascii = %String::from_utf8_lossy(chunk),
            "message received"
        );

        match kind {
            ProtocolKind::Ssl2 => match parse_ssl2_record(chunk) {
                Ok(record) => tracing::debug!(
                    msg_type = record.msg_type_name,
                    record_length = record.record_length,
                    version = record.version.unwrap_or("n/a"),
                    "SSL2 record"
                ),
                Err(e) => tracing::debug!(error = %e, "SSL2 record undecodable"),
            },
            ProtocolKind::Ssl3 => match parse_ssl3_record(chunk) {
                Ok(record) => tracing::debug!(
                    version = record.version,
                    handshake = record.handshake_type_name.unwrap_or("n/a"),
                    length = record.length,
                    "SSL3 record"
                ),
                Err(e) => tracing::debug!(error = %e, "SSL3 record undecodable"),
            },
            ProtocolKind::Tls => match parse_tls_record(chunk) {
                Ok(record) => tracing::debug!(
                    version = record.version,
                    handshake = record.handshake_type_name.unwrap_or("n/a"),
                    cipher_suites = ?record.cipher_suites,
                    "TLS record"
                ),
                Err(e) => tracing::debug!(error = %e, "TLS record undecodable"),
            },
            ProtocolKind::Ssh => {
                if let Some(ident) = parse_ssh_ident(chunk) {
                    tracing::debug!(
                        protocol_version = %ident.protocol_version,
                        software = ident.software_version.as_deref().unwrap_or("n/a"),
                        "SSH identification"
                    );
                }
            }
            _ => {}
        }
    }

    /// Deliver `chunk` plus a line terminator to every other tracked
    /// session across all listening ports. Sessions that fail to accept
    /// the write (for example closed mid-broadcast) are skipped.
    async fn broadcast(&self, sender: &Arc<Session>, chunk: &[u8]) {
        let mut payload = Vec::with_capacity(chunk.len() + 1);
        payload.extend_from_slice(chunk);
        payload.push(b'\n');

        for peer in self.registry.snapshot().await {
            if peer.id() == sender.id() {
                continue;
            }
            if let Err(e) = peer.write(&payload).await {
                tracing::debug!(peer = peer.id(), error = %e, "skipping peer during broadcast");
            }
        }
    }
}
