use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// Current snapshot of the registry.
pub async fn list_connections(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let connections = state.registry.list_active().await?;
    Ok(Json(serde_json::json!({
        "data": connections,
        "count": connections.len(),
    })))
}
