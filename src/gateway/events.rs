use serde::{Deserialize, Serialize};

/// Route keys a client may put in the `action` field of a frame.
pub mod action {
    pub const MESSAGE: &str = "message";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// Minimal view of an inbound frame, used only to pick the route.
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    pub action: Option<String>,
}

/// Frames the gateway itself sends. Broadcast deliveries are written as-is
/// and are not wrapped in this envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Hello {
        connection_id: String,
        heartbeat_interval: u64,
    },
    HeartbeatAck,
    Error {
        message: String,
    },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_frame_shape() {
        let json: serde_json::Value = serde_json::from_str(
            &ServerFrame::Hello {
                connection_id: "abc".to_string(),
                heartbeat_interval: 30000,
            }
            .to_json(),
        )
        .unwrap();
        assert_eq!(json["type"], "hello");
        assert_eq!(json["connection_id"], "abc");
        assert_eq!(json["heartbeat_interval"], 30000);
    }

    #[test]
    fn test_heartbeat_ack_is_bare_type() {
        assert_eq!(ServerFrame::HeartbeatAck.to_json(), r#"{"type":"heartbeat_ack"}"#);
    }

    #[test]
    fn test_client_frame_without_action() {
        let frame: ClientFrame = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(frame.action.is_none());
    }
}
