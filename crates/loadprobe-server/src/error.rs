//! HTTP mapping for `LoadProbeError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use loadprobe_core::LoadProbeError;

/// Handler error wrapper; client errors become 4xx, the rest 500.
#[derive(Debug)]
pub struct ApiError(pub LoadProbeError);

impl From<LoadProbeError> for ApiError {
    fn from(e: LoadProbeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            // Plain text, matching the other stress control bodies.
            LoadProbeError::InvalidAction(_) => {
                (StatusCode::BAD_REQUEST, "Invalid action\n").into_response()
            }
            LoadProbeError::DivisionByZero => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Cannot divide by zero" })),
            )
                .into_response(),
            LoadProbeError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            other => {
                let code = other.client_code();
                let status = if code.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    tracing::error!(error = %other, "request failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, Json(json!({ "error": code.as_str() }))).into_response()
            }
        }
    }
}
