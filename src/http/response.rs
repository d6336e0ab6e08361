//! Error responses
//!
//! Maps engine errors onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::KvError;

/// An error returned to an HTTP client as a plain-text body
#[derive(Debug, Clone)]
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

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<KvError> for ApiError {
    fn from(e: KvError) -> Self {
        let status = match e {
            KvError::KeyNotFound => StatusCode::NOT_FOUND,
            KvError::EmptyKey => StatusCode::BAD_REQUEST,
            KvError::LogState { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
