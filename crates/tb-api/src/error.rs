//! HTTP mapping of failures. Every error leaves as JSON
//! `{ "success": false, "message": ..., "error": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tb_core::AppError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// The query string could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::Store(_))
            | ApiError::App(AppError::Internal(_))
            | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::App(AppError::Validation(_)) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST_ERROR",
            ApiError::App(AppError::NotFound(..)) => "NOT_FOUND_ERROR",
            ApiError::App(AppError::Store(_)) => "STORE_ERROR",
            ApiError::App(AppError::Internal(_)) => "INTERNAL_SERVER_ERROR",
            ApiError::Render(_) => "RENDER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
        }

        let body = json!({
            "success": false,
            "message": self.to_string(),
            "error": self.code(),
        });
        (status, Json(body)).into_response()
    }
}
