//! Connection dispatch: sessions, per-chunk routing, and listeners.
//!
//! Framing assumption carried over from the legacy suite: each read event
//! on a socket is one application-level message. A production hardening
//! pass would reassemble NPS frames by their declared length instead;
//! this crate deliberately preserves the per-event behavior.

mod dispatcher;
mod handler;
mod server;
mod session;

pub use dispatcher::Dispatcher;
pub use handler::{EchoHandler, NpsEnvelope, NpsHandler};
pub use server::GatewayServer;
pub use session::{Session, SessionRegistry, SessionState};
