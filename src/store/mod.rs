//! Key-value storage for connection metadata.
//!
//! The registry only sees the [`ConnectionStore`] trait; the concrete backend
//! is picked at startup from configuration.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::connection::Connection;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Page size used when enumerating the whole store.
pub const SCAN_PAGE_SIZE: usize = 500;

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Write `conn` under its id, replacing any previous value. The entry
    /// becomes eligible for removal once `conn.expires_at` has passed.
    async fn put(&self, conn: &Connection) -> Result<(), AppError>;

    /// Delete the entry for `id`. Deleting an absent key is not an error.
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Up to `limit` unexpired entries with ids strictly greater than `after`,
    /// ordered by id.
    async fn scan_page(&self, after: Option<&str>, limit: usize)
        -> Result<Vec<Connection>, AppError>;

    /// Remove every entry that expired at or before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Snapshot of every entry the store currently holds.
    async fn scan(&self) -> Result<Vec<Connection>, AppError> {
        let mut all = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page = self.scan_page(after.as_deref(), SCAN_PAGE_SIZE).await?;
            let exhausted = page.len() < SCAN_PAGE_SIZE;
            after = page.last().map(|c| c.id.clone());
            all.extend(page);
            if exhausted {
                break;
            }
        }
        Ok(all)
    }
}
