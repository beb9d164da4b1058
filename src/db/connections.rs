use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::connection::Connection;

fn row_to_connection(row: sqlx::sqlite::SqliteRow) -> Connection {
    let connected_at: i64 = row.get("connected_at");
    let expires_at: i64 = row.get("expires_at");
    Connection {
        id: row.get("id"),
        user_id: row.get("user_id"),
        connected_at: DateTime::from_timestamp_millis(connected_at).unwrap_or_default(),
        expires_at: DateTime::from_timestamp_millis(expires_at).unwrap_or_default(),
    }
}

/// Insert a connection, replacing any existing row with the same id.
pub async fn upsert_connection(pool: &SqlitePool, conn: &Connection) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO connections (id, user_id, connected_at, expires_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           user_id = excluded.user_id,
           connected_at = excluded.connected_at,
           expires_at = excluded.expires_at",
    )
    .bind(&conn.id)
    .bind(&conn.user_id)
    .bind(conn.connected_at.timestamp_millis())
    .bind(conn.expires_at.timestamp_millis())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_connection(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM connections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// One keyset page of unexpired connections, ordered by id.
pub async fn list_page(
    pool: &SqlitePool,
    after: Option<&str>,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Connection>, AppError> {
    let rows = sqlx::query(
        "SELECT id, user_id, connected_at, expires_at FROM connections
         WHERE (?1 IS NULL OR id > ?1) AND expires_at > ?2
         ORDER BY id
         LIMIT ?3",
    )
    .bind(after)
    .bind(now.timestamp_millis())
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_connection).collect())
}

/// Delete every row whose TTL has passed. Returns the number of rows removed.
pub async fn delete_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM connections WHERE expires_at <= ?")
        .bind(now.timestamp_millis())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn get_connection(pool: &SqlitePool, id: &str) -> Result<Option<Connection>, AppError> {
    let row = sqlx::query(
        "SELECT id, user_id, connected_at, expires_at FROM connections WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_connection))
}
