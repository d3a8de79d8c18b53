//! Loopback backend HTTP application.
//!
//! The bridge forwards reconstructed requests here. Business routes
//! (login, shard listing) live outside this crate; the backend ships a
//! health endpoint and a catch-all so the forwarding path stays
//! end-to-end functional, plus the request log the original application
//! kept (with password query values redacted).

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use crate::error::{GatewayError, Result};

/// Build the backend router.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(fallback)
        .layer(middleware::from_fn(log_request))
}

/// Serve the backend on `127.0.0.1:port`.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Server(format!("failed to bind backend to {addr}: {e}")))?;

    tracing::info!(%addr, "backend application listening");

    axum::serve(listener, router())
        .await
        .map_err(|e| GatewayError::Server(format!("backend server error: {e}")))?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn fallback() -> &'static str {
    "Request forwarded to backend."
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(redact_password);
    tracing::info!(%method, %path, query = query.as_deref().unwrap_or(""), "backend request");
    next.run(request).await
}

/// Mask the value of any `password` query parameter.
fn redact_password(query: &str) -> String {
    query
        .split('&')
        .map(|pair| {
            if pair.split('=').next() == Some("password") {
                "password=[REDACTED]".to_string()
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_password_only() {
        assert_eq!(
            redact_password("username=admin&password=hunter2"),
            "username=admin&password=[REDACTED]"
        );
        assert_eq!(redact_password("username=admin"), "username=admin");
    }

    #[test]
    fn test_redact_handles_empty_value() {
        assert_eq!(redact_password("password="), "password=[REDACTED]");
    }
}
