//! User endpoints: registration upsert and the public user listing

use crate::api::ApiJson;
use crate::auth::models::User;
use crate::error::ApiError;
use crate::store::{UpdateResult, UserStore};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Register or update a user - PUT /users/:email
pub async fn register_user(
    State(users): State<Arc<UserStore>>,
    Path(email): Path<String>,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<UpdateResult>, ApiError> {
    let result = users.upsert_by_email(&email, fields)?;
    Ok(Json(result))
}

/// GET /users
pub async fn list_users(State(users): State<Arc<UserStore>>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(users.list_all()?))
}
