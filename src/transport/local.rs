use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use super::{SendOutcome, Transport, TransportProvider};

/// Outbound frames buffered per socket before sends start to wait.
pub const SESSION_BUFFER: usize = 256;

/// Outbound channels of the WebSocket sessions served by this process.
#[derive(Clone, Default)]
pub struct SessionTable {
    sessions: Arc<DashMap<String, mpsc::Sender<String>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the outbound channel for a new socket. The caller drains the
    /// receiver into the socket.
    pub fn open(&self, connection_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions.insert(connection_id.to_string(), tx);
        rx
    }

    pub fn close(&self, connection_id: &str) {
        self.sessions.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sender(&self, connection_id: &str) -> Option<mpsc::Sender<String>> {
        self.sessions.get(connection_id).map(|tx| tx.clone())
    }
}

/// Delivers into sockets held by this process. A target with no session, or
/// whose socket task has exited, is reported as gone.
#[derive(Clone)]
pub struct LocalTransport {
    sessions: SessionTable,
    timeout: Duration,
}

impl LocalTransport {
    pub fn new(sessions: SessionTable, timeout: Duration) -> Self {
        Self { sessions, timeout }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, target_id: &str, payload: &str) -> SendOutcome {
        let Some(tx) = self.sessions.sender(target_id) else {
            return SendOutcome::Gone;
        };
        match tx.send_timeout(payload.to_string(), self.timeout).await {
            Ok(()) => SendOutcome::Delivered,
            Err(SendTimeoutError::Closed(_)) => {
                self.sessions.close(target_id);
                SendOutcome::Gone
            }
            Err(SendTimeoutError::Timeout(_)) => {
                SendOutcome::Failed(format!("send timed out after {:?}", self.timeout))
            }
        }
    }
}

impl TransportProvider for LocalTransport {
    // Every local socket is reachable regardless of the endpoint.
    fn resolve(&self, _endpoint: &str) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }
}
