use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Malformed or empty inbound signal. Never retried internally.
    Validation(String),
    /// The connection store is unreachable or failed unexpectedly.
    Storage(String),
    Database(sqlx::Error),
    Internal(String),
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Database(_))
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_request",
            AppError::Storage(_) => "storage_error",
            AppError::Database(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Storage(e) => {
                tracing::error!("storage error: {e}");
                "connection store unavailable".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                "connection store unavailable".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e}");
                "internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message()
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::Validation("empty".to_string());
        assert!(err.is_validation());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_errors_map_to_server_error() {
        let err = AppError::Storage("unreachable".to_string());
        assert!(err.is_storage());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_storage());
        assert!(!err.is_validation());
    }
}
