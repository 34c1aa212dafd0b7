//! Listing endpoints
//!
//! `GET /houses` sits behind the owner gate; `GET /houses/show` is the same
//! listing for everyone.

use crate::api::ApiJson;
use crate::error::ApiError;
use crate::store::houses::parse_price;
use crate::store::{DeleteResult, House, HouseUpdate, InsertResult, ListingStore, UpdateResult};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// Body of `PUT /updateHouses/:id`; missing text fields are stored as null
#[derive(Debug, Deserialize)]
pub struct UpdateHouseRequest {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub address: Value,
    #[serde(default)]
    pub city: Value,
    #[serde(default)]
    pub price: Value,
}

/// POST /houses
pub async fn create_house(
    State(listings): State<Arc<ListingStore>>,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<InsertResult>, ApiError> {
    Ok(Json(listings.create(fields)?))
}

/// Owner view of every listing - GET /houses
pub async fn list_houses(
    State(listings): State<Arc<ListingStore>>,
) -> Result<Json<Vec<House>>, ApiError> {
    Ok(Json(listings.list_all()?))
}

/// Public view of every listing - GET /houses/show
pub async fn show_houses(
    State(listings): State<Arc<ListingStore>>,
) -> Result<Json<Vec<House>>, ApiError> {
    Ok(Json(listings.list_all()?))
}

/// PUT /updateHouses/:id
pub async fn update_house(
    State(listings): State<Arc<ListingStore>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateHouseRequest>,
) -> Result<Json<UpdateResult>, ApiError> {
    let Some(price) = parse_price(&body.price) else {
        warn!("Rejected update of house {}: price {} is not a number", id, body.price);
        return Err(ApiError::InvalidInput("price must be a number".to_string()));
    };

    let update = HouseUpdate {
        name: body.name,
        address: body.address,
        city: body.city,
        price,
    };

    Ok(Json(listings.update_by_id(&id, &update)?))
}

/// DELETE /houses/:id
pub async fn delete_house(
    State(listings): State<Arc<ListingStore>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(listings.delete_by_id(&id)?))
}
