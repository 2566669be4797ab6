use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use huddle_engine::MessagingError;

/// HTTP face of [`MessagingError`].
#[derive(Debug)]
pub struct ApiError(pub MessagingError);

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self(MessagingError::Internal(detail.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MessagingError::Unauthenticated(_) | MessagingError::Forbidden(_) => {
                (StatusCode::FORBIDDEN, self.0.to_string())
            }
            MessagingError::NotFound(_) | MessagingError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            MessagingError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
