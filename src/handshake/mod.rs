//! Cleartext handshake decoding for SSL2, SSL3, and TLS records.
//!
//! The gateway terminates none of these protocols; the decoders exist so
//! that handshake traffic arriving on a game port can be logged in a
//! structured form before it is routed to the broadcast fallback. Each
//! decoder is stateless and bounds-checked throughout.

pub mod ssl2;
pub mod ssl3;
pub mod tls;

pub use ssl2::{parse_ssl2_record, Ssl2Body, Ssl2Record};
pub use ssl3::parse_ssl3_record;
pub use tls::{parse_tls_record, HandshakeRecord};

/// TLS/SSL3 record content type marking a handshake message.
pub const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
