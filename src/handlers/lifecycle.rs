use crate::error::AppError;
use crate::models::connection::Connection;
use crate::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct LifecycleHandler {
    registry: ConnectionRegistry,
}

impl LifecycleHandler {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Register a newly opened connection. An error here means the gateway
    /// should reject the connection.
    pub async fn on_connect(
        &self,
        connection_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Connection, AppError> {
        let id = connection_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("connection id not found".to_string()))?;

        let conn = self.registry.register(id, user_id).await?;
        tracing::info!(connection_id = %id, user_id = ?user_id, "connection stored");
        Ok(conn)
    }

    /// Forget a closed connection. Always acknowledges: a store failure is
    /// logged and the entry is left to expire.
    pub async fn on_disconnect(&self, connection_id: &str) {
        match self.registry.remove(connection_id).await {
            Ok(()) => tracing::info!(connection_id = %connection_id, "connection removed"),
            Err(e) => tracing::error!(
                connection_id = %connection_id,
                "failed to remove connection on disconnect: {:?}",
                e
            ),
        }
    }
}
