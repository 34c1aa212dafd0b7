//! Authentication API Endpoints
//! Mission: Token issuance, login and identity lookups

use crate::api::ApiJson;
use crate::auth::{
    jwt::JwtHandler,
    middleware::AuthUser,
    models::{CheckAuthResponse, LoginRequest, LoginResponse, RoleInfo, TokenRequest, UserRole},
};
use crate::error::ApiError;
use crate::store::UserStore;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Map;
use std::sync::Arc;
use tracing::{info, warn};

/// Issue a token for an arbitrary claim set - POST /jwt
///
/// Answers with the bare token string.
pub async fn issue_token(
    State(jwt_handler): State<Arc<JwtHandler>>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<String, ApiError> {
    let token = jwt_handler.generate_token(&payload.email, payload.extra)?;
    Ok(token)
}

/// Echo the authenticated identity - GET /users/checkAuth
pub async fn check_auth(AuthUser(claims): AuthUser) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse {
        email: claims.email,
    })
}

/// Login endpoint - POST /login
///
/// Any registered email gets a token; there is no password.
pub async fn login(
    State(jwt_handler): State<Arc<JwtHandler>>,
    State(users): State<Arc<UserStore>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(user) = users.find_by_email(&payload.email)? else {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(ApiError::InvalidCredentials);
    };

    let token = jwt_handler.generate_token(&user.email, Map::new())?;

    info!("🔐 Login successful: {} ({})", user.email, user.role().as_str());

    Ok(Json(LoginResponse { token }))
}

/// Role flags of the caller - GET /users/roleInfo/:email
pub async fn role_info(
    State(users): State<Arc<UserStore>>,
    AuthUser(claims): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<RoleInfo>, ApiError> {
    if claims.email != email {
        warn!("🚫 {} asked for the role of {}", claims.email, email);
        return Err(ApiError::Forbidden);
    }

    let role = users
        .find_by_email(&email)?
        .map(|user| user.role())
        .unwrap_or(UserRole::Unset);

    Ok(Json(RoleInfo::from_role(role)))
}
