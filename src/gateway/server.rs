//! Multi-port TCP listeners and the per-connection read loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

use crate::bridge::HttpBridge;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};

use super::dispatcher::Dispatcher;
use super::handler::NpsHandler;
use super::session::{Session, SessionRegistry};

/// Read buffer size per connection. One read event is treated as one
/// application-level message.
const READ_BUF_LEN: usize = 64 * 1024;

/// The gateway: one TCP listener per configured port, all feeding a
/// shared dispatcher and session registry.
pub struct GatewayServer {
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
}

impl GatewayServer {
    /// Build a gateway from config and an NPS handler collaborator.
    pub fn new(config: GatewayConfig, handler: Arc<dyn NpsHandler>) -> Self {
        let registry = SessionRegistry::new();
        let bridge = HttpBridge::new(config.backend_port);
        let dispatcher = Arc::new(Dispatcher::new(registry, bridge, handler));
        Self { config, dispatcher }
    }

    /// The shared session registry.
    pub fn registry(&self) -> SessionRegistry {
        self.dispatcher.registry().clone()
    }

    /// Bind every configured port and spawn its accept loop.
    ///
    /// A port that fails to bind is logged and skipped; the others keep
    /// going. Returns the local addresses actually bound, which matters
    /// when a port was configured as 0.
    pub async fn start(&self) -> Result<Vec<SocketAddr>> {
        let mut bound = Vec::with_capacity(self.config.ports.len());

        for &port in &self.config.ports {
            let addr = format!("{}:{}", self.config.host, port);
            let listener = match TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    let err = GatewayError::Bind { port, source: e };
                    tracing::error!(host = %self.config.host, port, error = %err, "failed to bind");
                    continue;
                }
            };
            let Ok(local_addr) = listener.local_addr() else {
                tracing::error!(port, "listener has no local address");
                continue;
            };
            tracing::info!(host = %self.config.host, port = local_addr.port(), "TCP server is running");
            bound.push(local_addr);

            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                accept_loop(listener, local_addr.port(), dispatcher).await;
            });
        }

        if bound.is_empty() {
            tracing::warn!("no gateway port could be bound");
        }
        Ok(bound)
    }
}

async fn accept_loop(listener: TcpListener, port: u16, dispatcher: Arc<Dispatcher>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer, port, dispatcher).await;
                });
            }
            Err(e) => {
                tracing::error!(port, error = %e, "accept failed");
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    port: u16,
    dispatcher: Arc<Dispatcher>,
) {
    let (mut reader, writer) = stream.into_split();
    let session = Arc::new(Session::new(peer.to_string(), port, writer));

    dispatcher.registry().insert(session.clone()).await;
    tracing::info!(
        port,
        remote = session.id(),
        connected_at = %session.created_at(),
        "client connected"
    );

    let mut buf = vec![0u8; READ_BUF_LEN];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = dispatcher.handle_chunk(&session, &buf[..n]).await {
                    tracing::error!(port, remote = session.id(), error = %e, "error handling socket data");
                    break;
                }
            }
            Err(e) => {
                tracing::error!(port, remote = session.id(), error = %e, "socket error");
                break;
            }
        }
    }

    session.mark_disconnected().await;
    dispatcher.registry().remove(session.id()).await;
    tracing::info!(port, remote = session.id(), "client disconnected");
}
