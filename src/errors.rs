use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::lifecycle::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("remote source error: {0}")]
    Remote(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Lifecycle(e) => match e {
                LifecycleError::MissingField(_) | LifecycleError::Invalid { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LifecycleError::KnownContact
                | LifecycleError::SlotUnavailable { .. }
                | LifecycleError::SlotTaken { .. }
                | LifecycleError::IllegalTransition { .. } => StatusCode::CONFLICT,
                LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
                LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
