//! Server-push delivery to a single named connection.

pub mod callback;
pub mod local;

use async_trait::async_trait;
use std::sync::Arc;

pub use callback::{CallbackProvider, CallbackTransport};
pub use local::{LocalTransport, SessionTable};

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The remote endpoint no longer exists.
    Gone,
    Failed(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Push `payload` to `target_id`. Implementations bound their own
    /// per-call latency; a hung send must come back as `Failed`.
    async fn send(&self, target_id: &str, payload: &str) -> SendOutcome;
}

/// Hands out a transport bound to a delivery endpoint such as
/// `https://{domain}/{stage}`.
pub trait TransportProvider: Send + Sync {
    fn resolve(&self, endpoint: &str) -> Arc<dyn Transport>;
}
