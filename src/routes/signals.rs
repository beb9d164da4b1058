use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// A signal forwarded by an external gateway.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewaySignal {
    Connect {
        connection_id: Option<String>,
        user_id: Option<String>,
    },
    Disconnect {
        connection_id: Option<String>,
    },
    Message {
        connection_id: Option<String>,
        domain: Option<String>,
        stage: Option<String>,
        body: Option<String>,
    },
}

pub async fn handle_signal(
    State(state): State<AppState>,
    Json(signal): Json<GatewaySignal>,
) -> Result<Json<serde_json::Value>, AppError> {
    match signal {
        GatewaySignal::Connect {
            connection_id,
            user_id,
        } => {
            state
                .lifecycle
                .on_connect(connection_id.as_deref(), user_id.as_deref())
                .await?;
            Ok(Json(serde_json::json!({ "message": "Connected" })))
        }
        GatewaySignal::Disconnect { connection_id } => {
            let id = connection_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::Validation("connection id not found".to_string()))?;
            state.lifecycle.on_disconnect(&id).await;
            Ok(Json(serde_json::json!({ "message": "Disconnected" })))
        }
        GatewaySignal::Message {
            connection_id,
            domain,
            stage,
            body,
        } => {
            let report = state
                .intake
                .on_message(
                    connection_id.as_deref().unwrap_or_default(),
                    domain.as_deref().unwrap_or_default(),
                    stage.as_deref().unwrap_or(&state.stage),
                    body.as_deref().unwrap_or_default(),
                )
                .await?;
            Ok(Json(serde_json::json!({
                "message": "Message sent",
                "delivered": report.delivered,
                "failed": report.failed,
            })))
        }
    }
}
