//! Role Gate
//! Mission: Admit only house owners to owner-only routes
//!
//! Runs after [`auth_middleware`](crate::auth::auth_middleware); the role is
//! read from the user store on every request, never from the token.

use crate::auth::models::{Claims, UserRole};
use crate::error::ApiError;
use crate::store::UserStore;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

pub async fn require_house_owner(
    State(users): State<Arc<UserStore>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.email.clone())
        .ok_or(ApiError::Unauthorized)?;

    let role = users
        .find_by_email(&email)?
        .map(|user| user.role())
        .unwrap_or(UserRole::Unset);

    if role != UserRole::HouseOwner {
        warn!(
            "🚫 {} denied {} (role: {})",
            email,
            req.uri().path(),
            role.as_str()
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}
