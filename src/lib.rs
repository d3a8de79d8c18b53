//! # NPS Gateway - Multi-Port TCP Gateway for a Legacy Game Suite
//!
//! Accepts raw byte streams on several TCP ports, classifies the wire
//! protocol per connection, parses protocol-specific structures, and
//! routes each connection's traffic to the right handling path: HTTP
//! reverse-proxying to a loopback backend, the proprietary framed "NPS"
//! message protocol, or a diagnostic broadcast fallback for handshake
//! and unknown traffic.
//!
//! ## Architecture
//!
//! ```text
//! Legacy client            Gateway                       Backend app
//!     |                       |                               |
//!     |==== raw TCP bytes ===>| classify                      |
//!     |                       |-- HTTP ----------------------)|
//!     |<== raw HTTP response =|<------------------------------|
//!     |                       |                               |
//!     |-- NPS frame --------->| decode -> handler -> reply    |
//!     |<-- NPS response ------|                               |
//!     |                       |                               |
//!     |-- SSL2/SSL3/TLS/SSH ->| decode handshake, log,        |
//!     |                       | broadcast to other sessions   |
//! ```
//!
//! ## Classification precedence
//!
//! First match wins, in this order:
//!
//! | # | Rule                                                  | Kind    |
//! |---|-------------------------------------------------------|---------|
//! | 1 | len > 2 and top bit of byte 0 set                     | SSL2    |
//! | 2 | len > 3 and prefix `16 03 00`                         | SSL3    |
//! | 3 | len > 3 and `16 03` with byte 2 in 1..=4              | TLS     |
//! | 4 | method token + space                                  | HTTP    |
//! | 5 | len > 4 and i16 BE at offset 2 == buffer length       | NPS     |
//! | 6 | starts with `SSH-`                                    | SSH     |
//! | 7 | otherwise                                             | Unknown |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use npsgate::{EchoHandler, GatewayConfig, GatewayServer};
//!
//! let config = GatewayConfig::from_env();
//! tokio::spawn(npsgate::backend::serve(config.backend_port));
//!
//! let gateway = GatewayServer::new(config, Arc::new(EchoHandler));
//! let bound = gateway.start().await?;
//! println!("listening on {bound:?}");
//! ```
//!
//! ## Modules
//!
//! - [`classify`]: protocol sniffing over buffer prefixes
//! - [`codec`]: NPS frame decoding and the schema cursor
//! - [`handshake`]: SSL2/SSL3/TLS cleartext handshake decoders
//! - [`gateway`]: sessions, dispatch, broadcast, listeners
//! - [`bridge`]: raw-HTTP reverse proxy to the loopback backend
//! - [`backend`]: the loopback backend application
//! - [`config`]: configuration management
//! - [`error`]: error types and result alias

pub mod backend;
pub mod bridge;
pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handshake;

// Re-exports for convenience
pub use bridge::HttpBridge;
pub use classify::{detect_protocol, ProtocolKind};
pub use codec::{parse_nps_message, NpsBody, NpsMessage};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Dispatcher, EchoHandler, GatewayServer, NpsEnvelope, NpsHandler, SessionRegistry};
pub use handshake::{parse_ssl2_record, parse_ssl3_record, parse_tls_record, HandshakeRecord, Ssl2Record};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
