//! Authentication Models
//! Mission: Define identity, role and token payload structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored user record. Everything except the key fields is kept as an
/// opaque profile document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    /// Role as stored in the profile's `role` field.
    pub fn role(&self) -> UserRole {
        self.profile
            .get("role")
            .and_then(Value::as_str)
            .map(UserRole::parse)
            .unwrap_or(UserRole::Unset)
    }
}

/// User roles for the owner gate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "houseOwner")]
    HouseOwner, // Publishes listings, may read the owner listing
    #[serde(rename = "houseRenter")]
    HouseRenter, // Browses and shortlists houses
    #[serde(rename = "unset")]
    Unset,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::HouseOwner => "houseOwner",
            UserRole::HouseRenter => "houseRenter",
            UserRole::Unset => "unset",
        }
    }

    /// Role names are matched exactly; anything unknown is `Unset`.
    pub fn parse(s: &str) -> Self {
        match s {
            "houseOwner" => UserRole::HouseOwner,
            "houseRenter" => UserRole::HouseRenter,
            _ => UserRole::Unset,
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub email: String,
    pub iat: i64, // issued-at timestamp
    pub exp: i64, // expiration timestamp
    /// Any other claims the caller asked to have signed
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /jwt`: an arbitrary claim object that must carry an email
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Identity echoed back by `GET /users/checkAuth`
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckAuthResponse {
    pub email: String,
}

/// Role flags for `GET /users/roleInfo/:email`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub house_owner: bool,
    pub house_renter: bool,
}

impl RoleInfo {
    pub fn from_role(role: UserRole) -> Self {
        Self {
            house_owner: role == UserRole::HouseOwner,
            house_renter: role == UserRole::HouseRenter,
        }
    }
}
