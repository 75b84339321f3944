//! API error handling

use crate::error::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::InvalidTransition { .. }
            | SessionError::SessionClosed(_)
            | SessionError::DuplicateSession(_)
            | SessionError::IncompleteSession(_) => StatusCode::CONFLICT,
            SessionError::InvalidWeights(_) | SessionError::InvalidSessionId(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionError::Persistence(_) | SessionError::RouterUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}
