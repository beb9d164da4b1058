use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::connection::BroadcastMessage;
use crate::registry::ConnectionRegistry;
use crate::transport::{SendOutcome, Transport};

/// Tally of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans a message out to every registered connection except the sender.
pub struct BroadcastDispatcher {
    registry: ConnectionRegistry,
    transport: Arc<dyn Transport>,
}

impl BroadcastDispatcher {
    pub fn new(registry: ConnectionRegistry, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Best-effort delivery over the current membership snapshot. Fails only
    /// on an empty body or when the snapshot itself cannot be read; per
    /// recipient failures are counted, never propagated.
    pub async fn broadcast(&self, sender_id: &str, body: &str) -> Result<BroadcastReport, AppError> {
        if body.is_empty() {
            return Err(AppError::Validation("message body must not be empty".to_string()));
        }

        let connections = self.registry.list_active().await?;

        let payload = serde_json::to_string(&BroadcastMessage::new(sender_id, body))
            .map_err(|e| AppError::Internal(format!("failed to encode broadcast: {e}")))?;

        let attempts = connections
            .iter()
            .filter(|conn| conn.id != sender_id)
            .map(|conn| self.deliver(&conn.id, &payload));
        let outcomes = join_all(attempts).await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let report = BroadcastReport {
            delivered,
            failed: outcomes.len() - delivered,
        };
        tracing::info!(
            sender = %sender_id,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast complete"
        );
        Ok(report)
    }

    async fn deliver(&self, target_id: &str, payload: &str) -> bool {
        match self.transport.send(target_id, payload).await {
            SendOutcome::Delivered => true,
            SendOutcome::Gone => {
                tracing::debug!(connection_id = %target_id, "target gone, removing from registry");
                if let Err(e) = self.registry.remove(target_id).await {
                    // Left for TTL expiry.
                    tracing::warn!(connection_id = %target_id, "failed to remove gone connection: {:?}", e);
                }
                false
            }
            SendOutcome::Failed(reason) => {
                tracing::warn!(connection_id = %target_id, "delivery failed: {reason}");
                false
            }
        }
    }
}
