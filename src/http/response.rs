//! Error responses.
//!
//! # Responsibilities
//! - Map service errors to HTTP status codes
//! - Render errors as `{"error": message}`
//!
//! # Status Mapping
//! - Malformed request → 400
//! - Undecodable or oversized body → the extractor's status (400, 413, 415, 422)
//! - Backend closed → 503
//! - Upstream failure or no upstream configuration → 502
//! - Anything else → 500

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::backend::BackendError;
use crate::service::ServiceError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Backend(BackendError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Backend(BackendError::Upstream(_))
            | ServiceError::Backend(BackendError::NoConfiguration) => StatusCode::BAD_GATEWAY,
            ServiceError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

/// Keeps the rejection's own status (400, 413, 415, 422).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
