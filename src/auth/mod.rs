//! Authentication Module
//! Mission: Bearer token identity and role-based access to owner routes

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod role_gate;

pub use jwt::{JwtHandler, TokenError};
pub use middleware::{auth_middleware, AuthUser};
pub use models::{Claims, User, UserRole};
pub use role_gate::require_house_owner;
