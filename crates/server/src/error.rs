use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recorder::{GatewayError, RecorderError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<RecorderError> for AppError {
    fn from(err: RecorderError) -> Self {
        match err {
            RecorderError::IllegalMove(_)
            | RecorderError::EmptyTitle
            | RecorderError::NothingToSave => AppError::BadRequest(err.to_string()),
            RecorderError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            RecorderError::NotSignedIn => AppError::Unauthorized,
            RecorderError::Identity(GatewayError::InvalidCredentials) => {
                AppError::BadRequest("Invalid email or password".into())
            }
            RecorderError::Identity(GatewayError::AccountExists) => {
                AppError::BadRequest("Email already registered".into())
            }
            RecorderError::Identity(GatewayError::Rejected(msg)) => AppError::BadRequest(msg),
            RecorderError::NotFound(_) => AppError::NotFound(err.to_string()),
            RecorderError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            RecorderError::Identity(_)
            | RecorderError::Persistence(_)
            | RecorderError::Corrupt(_)
            | RecorderError::Reconstruction(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Anyhow(e) => {
                tracing::error!("Unexpected error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_errors_map_to_status() {
        let cases = [
            (RecorderError::EmptyTitle, StatusCode::BAD_REQUEST),
            (RecorderError::NotSignedIn, StatusCode::UNAUTHORIZED),
            (RecorderError::Forbidden(3), StatusCode::FORBIDDEN),
            (RecorderError::NotFound(3), StatusCode::NOT_FOUND),
            (
                RecorderError::InvalidTransition {
                    view: recorder::View::Replay,
                    action: "make a move",
                },
                StatusCode::CONFLICT,
            ),
            (
                RecorderError::Persistence(GatewayError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecorderError::Identity(GatewayError::InvalidCredentials),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
