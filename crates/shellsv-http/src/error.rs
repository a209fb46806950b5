use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shellsv_core::ShellSvError;

use crate::format::Format;

/// Wraps a [`ShellSvError`] with the format it should be rendered in, so a
/// single `IntoResponse` impl covers every handler's error path.
pub struct ApiError {
    error: ShellSvError,
    format: Format,
}

impl ApiError {
    pub fn new(error: ShellSvError, format: Format) -> Self {
        Self { error, format }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            ShellSvError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShellSvError::NotFound(_) => StatusCode::NOT_FOUND,
            ShellSvError::Conflict(_) => StatusCode::CONFLICT,
            ShellSvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if matches!(self.error, ShellSvError::Internal(_)) {
            tracing::warn!(error = %self.error, "request failed with an internal error");
        }
        let message = self.error.to_string();
        match self.format {
            Format::Json => (status, axum::Json(serde_json::json!({ "error": message }))).into_response(),
            Format::Text => (status, format!("error: {message}\n")).into_response(),
        }
    }
}
