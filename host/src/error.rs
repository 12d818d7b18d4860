//! Error types for the upstream client and the relay handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure talking to the sensor backend (or to the relay in front of it).
#[derive(Debug, Error)]
pub enum ClientError {
    /// network unreachable, timeout, connection reset
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// non-2xx response; `message` is what the backend said, when it said anything
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body did not decode
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// input rejected before (or by) the backend
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
            || matches!(self, ClientError::Status { status, .. } if (400..500).contains(status))
    }

    /// reason to show the user, verbatim from the backend where possible
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { message, .. } | ClientError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Error returned by relay handlers; the body shape mirrors the backend's.
#[derive(Debug)]
pub enum AppError {
    /// mutation failed: `400 {"status": msg}`
    Rejected(String),
    /// read failed: `500 {"error": msg}`
    Upstream(&'static str),
    /// unknown id on a dashboard route: `404 {"error": msg}`
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Rejected(msg) => (StatusCode::BAD_REQUEST, Json(json!({ "status": msg }))).into_response(),
            AppError::Upstream(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response(),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::Rejected(err.user_message())
    }
}
