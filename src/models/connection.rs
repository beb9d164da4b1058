use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One live client session, keyed by the id the gateway assigned at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub user_id: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(id: &str, user_id: Option<&str>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.map(str::to_string),
            connected_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Payload pushed to every recipient of a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub message: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastMessage {
    /// The timestamp is stamped here, at dispatch time, never by the sender.
    pub fn new(sender: &str, body: &str) -> Self {
        Self {
            message: body.to_string(),
            sender: sender.to_string(),
            timestamp: Utc::now(),
        }
    }
}
