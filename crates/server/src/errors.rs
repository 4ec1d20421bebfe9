use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use service::errors::ServiceError;

/// JSON API error: status code plus an `{"error": ..., "detail": ...}` body.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(detail.into()))
    }

    /// Map service-layer failures onto the HTTP taxonomy: not-found -> 404,
    /// invalid-state and validation -> 400, everything else -> 500 with the
    /// given title.
    pub fn from_service(e: ServiceError, context: &'static str) -> Self {
        match e {
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::InvalidState(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid State", Some(msg))
            }
            ServiceError::Validation(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg))
            }
            ServiceError::Model(e) => {
                Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string()))
            }
            ServiceError::Conflict(msg) => {
                Self::new(StatusCode::CONFLICT, "Conflict", Some(msg))
            }
            other => {
                error!(err = %other, context, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, context, Some(other.to_string()))
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({"error": self.title, "detail": self.detail});
        (self.status, Json(body)).into_response()
    }
}
