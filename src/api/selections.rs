//! Selected-house endpoints, always scoped to the caller's token email

use crate::api::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::store::{
    CreateOutcome, DeleteOutcome, DeleteResult, InsertResult, NewSelection, Selection,
    SelectionStore,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// Body of `POST /selectedHouses`
#[derive(Debug, Deserialize)]
pub struct SelectHouseRequest {
    /// Defaults to the token email; any other value is refused
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "houseId")]
    pub house_id: Option<String>,
    /// Fallback name for the house; `houseId` wins when both are sent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// GET /selectedHouses
pub async fn list_selected(
    State(selections): State<Arc<SelectionStore>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Selection>>, ApiError> {
    Ok(Json(selections.list_for_user(&claims.email)?))
}

/// POST /selectedHouses
pub async fn create_selected(
    State(selections): State<Arc<SelectionStore>>,
    AuthUser(claims): AuthUser,
    ApiJson(body): ApiJson<SelectHouseRequest>,
) -> Result<Json<InsertResult>, ApiError> {
    if let Some(email) = body.email.as_deref() {
        if email != claims.email {
            warn!("🚫 {} tried to select a house for {}", claims.email, email);
            return Err(ApiError::Forbidden);
        }
    }

    let house_id = body
        .house_id
        .or(body.id)
        .ok_or_else(|| ApiError::InvalidInput("houseId is required".to_string()))?;

    let selection = NewSelection {
        email: claims.email,
        house_id,
        fields: body.extra,
    };

    match selections.create(selection)? {
        CreateOutcome::Inserted(result) => Ok(Json(result)),
        CreateOutcome::LimitReached => Err(ApiError::LimitReached),
        CreateOutcome::Duplicate => Err(ApiError::Duplicate),
    }
}

/// DELETE /selectedHouses/:id
pub async fn delete_selected(
    State(selections): State<Arc<SelectionStore>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    match selections.delete_owned(&id, &claims.email)? {
        DeleteOutcome::Deleted(result) => Ok(Json(result)),
        DeleteOutcome::NotOwner => Err(ApiError::Forbidden),
    }
}
