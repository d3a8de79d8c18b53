//! Gateway error types.
//!
//! Decode failures are ordinary values, never panics: a decoder either
//! returns a fully-populated record or `GatewayError::MalformedFrame`.
//! Every failure is terminal to the smallest affected unit (one decode,
//! one session, or one listener).

use thiserror::Error;

/// Gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A decoder detected insufficient bytes, a bad length reference, or a
    /// frame whose declared and actual lengths disagree.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The HTTP bridge failed to reach or read from the backend.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A listener failed to bind its port. Other listeners continue.
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        /// The port that could not be bound.
        port: u16,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::Config(err.to_string())
    }
}
