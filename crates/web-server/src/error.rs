use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::ErrorKind;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Symbol '{0}' is not part of this report")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        };
        tracing::debug!(error = %self, "Request rejected");

        let body = Json(json!({ "kind": self.kind(), "error": self.to_string() }));
        (status, body).into_response()
    }
}
