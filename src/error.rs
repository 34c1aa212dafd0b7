//! API Errors
//! Mission: One error envelope for every route

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Every failure a handler or middleware can answer with.
///
/// All variants render as `{"error": <code>, "message": <text>}` with the
/// matching status code.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    InvalidCredentials,
    Forbidden,
    LimitReached,
    Duplicate,
    InvalidInput(String),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::LimitReached | ApiError::Duplicate => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code placed in the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Forbidden => "forbidden",
            ApiError::LimitReached => "limit reached",
            ApiError::Duplicate => "duplicate",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized access".to_string(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::Forbidden => "forbidden".to_string(),
            ApiError::LimitReached => "You can select at most 2 houses".to_string(),
            ApiError::Duplicate => "House already selected".to_string(),
            ApiError::InvalidInput(msg) => msg.clone(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("Request failed: {:#}", err);
        }

        let body = json!({
            "error": self.code(),
            "message": self.message(),
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}
