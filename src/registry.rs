use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::connection::Connection;
use crate::store::ConnectionStore;

pub const DEFAULT_CONNECTION_TTL: Duration = Duration::hours(24);

/// Domain view over the connection store. Owns the id -> metadata mapping;
/// everything else goes through these operations.
#[derive(Clone)]
pub struct ConnectionRegistry {
    store: Arc<dyn ConnectionStore>,
    ttl: Duration,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn ConnectionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Upsert `id` with a fresh TTL. Registering an id twice leaves a single
    /// entry whose expiry is counted from the second call.
    pub async fn register(&self, id: &str, user_id: Option<&str>) -> Result<Connection, AppError> {
        if id.is_empty() {
            return Err(AppError::Validation("connection id must not be empty".to_string()));
        }
        let conn = Connection::new(id, user_id, Utc::now(), self.ttl);
        self.store.put(&conn).await?;
        tracing::debug!(connection_id = %id, expires_at = %conn.expires_at, "connection registered");
        Ok(conn)
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(id).await?;
        tracing::debug!(connection_id = %id, "connection removed");
        Ok(())
    }

    /// Point-in-time snapshot of known connections, in no particular order.
    /// Entries past their TTL may still show up if the backend has not
    /// evicted them yet.
    pub async fn list_active(&self) -> Result<Vec<Connection>, AppError> {
        self.store.scan().await
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.store.purge_expired(Utc::now()).await
    }
}
