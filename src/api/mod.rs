//! HTTP Handlers
//! Mission: Map each route onto one store operation

pub mod houses;
pub mod selections;
pub mod users;

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `Json` extractor whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Liveness probe - GET /
pub async fn liveness() -> &'static str {
    "House Hunter is running!"
}
