use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use super::ConnectionStore;
use crate::error::AppError;
use crate::models::connection::Connection;

/// In-process store. Expired entries are evicted lazily whenever the store
/// is scanned, or eagerly by `purge_expired`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Connection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn put(&self, conn: &Connection) -> Result<(), AppError> {
        self.entries.insert(conn.id.clone(), conn.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.entries.remove(id);
        Ok(())
    }

    async fn scan_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Connection>, AppError> {
        let now = Utc::now();
        self.entries.retain(|_, conn| !conn.is_expired(now));

        let mut page: Vec<Connection> = self
            .entries
            .iter()
            .filter(|entry| after.map_or(true, |a| entry.key().as_str() > a))
            .map(|entry| entry.value().clone())
            .collect();
        page.sort_by(|a, b| a.id.cmp(&b.id));
        page.truncate(limit);
        Ok(page)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let before = self.entries.len();
        self.entries.retain(|_, conn| !conn.is_expired(now));
        Ok((before - self.entries.len()) as u64)
    }
}
