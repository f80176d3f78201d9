use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::ServiceError;
use tracing::debug;

/// JSON error body: `{"error": <code>, "message": <detail>}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn not_found(account_id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("account {account_id} not found"))
    }
}

// Every ledger rule violation is the caller's fault, so all of them are 400.
impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.code(), e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(status = %self.status, code = self.code, message = %self.message, "request rejected");
        (self.status, Json(serde_json::json!({"error": self.code, "message": self.message}))).into_response()
    }
}
