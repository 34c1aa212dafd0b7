//! House Hunter Backend Library
//!
//! Rental listing API: token identity, an owner-only listing view and a
//! two-house shortlist per user. The router is built here so the binary and
//! the integration tests serve the same app.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod store;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{api as auth_api, auth_middleware, require_house_owner, JwtHandler};
use crate::store::{Database, ListingStore, SelectionStore, UserStore};

/// Shared handler state; each field is extractable on its own via `State<_>`
#[derive(Clone, FromRef)]
pub struct AppState {
    pub jwt_handler: Arc<JwtHandler>,
    pub users: Arc<UserStore>,
    pub listings: Arc<ListingStore>,
    pub selections: Arc<SelectionStore>,
}

impl AppState {
    pub fn new(db: Database, jwt_handler: JwtHandler) -> Self {
        Self {
            jwt_handler: Arc::new(jwt_handler),
            users: Arc::new(db.users()),
            listings: Arc::new(db.listings()),
            selections: Arc::new(db.selections()),
        }
    }
}

/// Build the full application router
pub fn build_app(state: AppState) -> Router {
    // Public routes
    let public_routes: Router<AppState> = Router::new()
        .route("/", get(api::liveness))
        .route("/jwt", post(auth_api::issue_token))
        .route("/login", post(auth_api::login))
        .route("/users", get(api::users::list_users))
        .route("/users/:email", put(api::users::register_user))
        .route("/houses", post(api::houses::create_house))
        .route("/houses/show", get(api::houses::show_houses))
        .route("/houses/:id", delete(api::houses::delete_house))
        .route("/updateHouses/:id", put(api::houses::update_house));

    // Bearer token required
    let protected_routes: Router<AppState> = Router::new()
        .route("/users/checkAuth", get(auth_api::check_auth))
        .route("/users/roleInfo/:email", get(auth_api::role_info))
        .route(
            "/selectedHouses",
            get(api::selections::list_selected).post(api::selections::create_selected),
        )
        .route(
            "/selectedHouses/:id",
            delete(api::selections::delete_selected),
        )
        .route_layer(from_fn_with_state(
            state.jwt_handler.clone(),
            auth_middleware,
        ));

    // Bearer token and houseOwner role; the last route_layer runs first
    let owner_routes: Router<AppState> = Router::new()
        .route("/houses", get(api::houses::list_houses))
        .route_layer(from_fn_with_state(state.users.clone(), require_house_owner))
        .route_layer(from_fn_with_state(
            state.jwt_handler.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(owner_routes)
        .with_state(state)
        .layer(from_fn(middleware::request_logging))
        .layer(CorsLayer::permissive())
}
