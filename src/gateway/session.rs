//! Per-connection session tracking.
//!
//! A session is one accepted TCP connection: identity is the peer's
//! `ip:port` string, and the session owns the socket's write half for its
//! lifetime. Sessions live in a process-wide registry owned by the
//! dispatcher; broadcast iterates a point-in-time snapshot of that
//! registry so concurrent disconnects never corrupt the iteration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Session lifecycle states. `Connected` is the initial state on accept;
/// `Disconnected` is terminal (stream end, processing error, or transport
/// error) and the session is removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted and tracked.
    Connected,
    /// Terminal; no retries, no reconnection.
    Disconnected,
}

/// One tracked connection.
pub struct Session {
    id: String,
    port: u16,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Session {
    /// Track a newly accepted connection.
    pub fn new(id: String, port: u16, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            port,
            created_at: Utc::now(),
            state: Mutex::new(SessionState::Connected),
            writer: Mutex::new(writer),
        }
    }

    /// Peer identity, `ip:port`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The listening port this connection arrived on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept timestamp, for log records only.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Transition to the terminal state.
    pub async fn mark_disconnected(&self) {
        *self.state.lock().await = SessionState::Disconnected;
    }

    /// Write bytes to the peer.
    pub async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("port", &self.port)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Shared, mutable, process-wide session registry.
///
/// Insert on connect, remove on disconnect, snapshot for broadcast. The
/// map is never exposed directly.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<String, Arc<Session>>>>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session under its peer id.
    pub async fn insert(&self, session: Arc<Session>) {
        self.inner
            .lock()
            .await
            .insert(session.id().to_string(), session);
    }

    /// Stop tracking a session.
    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.inner.lock().await.remove(id)
    }

    /// Point-in-time snapshot of all tracked sessions.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.inner.lock().await.values().cloned().collect()
    }

    /// Number of tracked sessions.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True when no sessions are tracked.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    async fn connected_pair() -> (OwnedWriteHalf, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (_, writer) = server.into_split();
        (writer, client)
    }

    #[tokio::test]
    async fn test_registry_insert_remove_snapshot() {
        let registry = SessionRegistry::new();
        let (writer, _client) = connected_pair().await;
        let session = Arc::new(Session::new("10.0.0.1:5000".to_string(), 8226, writer));

        registry.insert(session.clone()).await;
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.snapshot().await[0].id(), "10.0.0.1:5000");

        registry.remove("10.0.0.1:5000").await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_session_state_transition() {
        let (writer, _client) = connected_pair().await;
        let session = Session::new("10.0.0.1:5000".to_string(), 8226, writer);
        assert_eq!(session.state().await, SessionState::Connected);
        session.mark_disconnected().await;
        assert_eq!(session.state().await, SessionState::Disconnected);
    }
}
