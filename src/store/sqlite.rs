use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::ConnectionStore;
use crate::db;
use crate::error::AppError;
use crate::models::connection::Connection;

/// Durable store backed by the `connections` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ConnectionStore for SqliteStore {
    async fn put(&self, conn: &Connection) -> Result<(), AppError> {
        db::connections::upsert_connection(&self.pool, conn).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        db::connections::delete_connection(&self.pool, id).await
    }

    async fn scan_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Connection>, AppError> {
        db::connections::list_page(&self.pool, after, Utc::now(), limit).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        db::connections::delete_expired(&self.pool, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteStore {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("failed to create test pool");
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_put_replaces_existing_row() {
        let store = store().await;
        let now = Utc::now();
        store
            .put(&Connection::new("c1", None, now, Duration::hours(1)))
            .await
            .unwrap();
        store
            .put(&Connection::new("c1", Some("u1"), now, Duration::hours(2)))
            .await
            .unwrap();

        let all = store.scan().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id.as_deref(), Some("u1"));
        assert_eq!(all[0].expires_at - all[0].connected_at, Duration::hours(2));
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let store = store().await;
        store.delete("missing").await.unwrap();
        assert!(db::connections::get_connection(store.pool(), "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_scan_pages_through_every_row() {
        let store = store().await;
        let now = Utc::now();
        for i in 0..(crate::store::SCAN_PAGE_SIZE + 7) {
            store
                .put(&Connection::new(&format!("c{i:05}"), None, now, Duration::hours(1)))
                .await
                .unwrap();
        }
        let all = store.scan().await.unwrap();
        assert_eq!(all.len(), crate::store::SCAN_PAGE_SIZE + 7);
    }

    #[tokio::test]
    async fn test_expired_rows_hidden_and_purged() {
        let store = store().await;
        let now = Utc::now();
        store
            .put(&Connection::new("old", None, now - Duration::hours(2), Duration::hours(1)))
            .await
            .unwrap();
        store
            .put(&Connection::new("new", None, now, Duration::hours(1)))
            .await
            .unwrap();

        let ids: Vec<String> = store.scan().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["new".to_string()]);

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert!(db::connections::get_connection(store.pool(), "old")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_first_page_matches_memory_backend() {
        use crate::store::MemoryStore;

        let sqlite = store().await;
        let memory = MemoryStore::new();
        let now = Utc::now();
        for id in ["", "a", "b"] {
            let conn = Connection::new(id, None, now, Duration::hours(1));
            sqlite.put(&conn).await.unwrap();
            memory.put(&conn).await.unwrap();
        }

        let from_sqlite: Vec<String> = sqlite.scan().await.unwrap().into_iter().map(|c| c.id).collect();
        let from_memory: Vec<String> = memory.scan().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(from_sqlite, vec!["".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(from_sqlite, from_memory);
    }
}
