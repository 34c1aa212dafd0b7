//! Authentication Middleware
//! Mission: Protect API endpoints with bearer token validation

use crate::auth::{jwt::JwtHandler, models::Claims};
use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        warn!("Rejected {}: missing bearer token", req.uri().path());
        ApiError::Unauthorized
    })?;

    let claims = jwt_handler.validate_token(token).map_err(|e| {
        warn!("Rejected {}: {}", req.uri().path(), e);
        ApiError::Unauthorized
    })?;

    // Add claims to request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Second whitespace-separated word of the `Authorization` header.
///
/// The scheme word itself is not checked.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .nth(1)
}

/// Claims of the authenticated caller.
///
/// Only valid behind [`auth_middleware`]; without it every request is
/// answered with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use serde_json::Map;
    use tower::ServiceExt;

    fn handler() -> Arc<JwtHandler> {
        Arc::new(JwtHandler::new("middleware-test-secret".to_string()))
    }

    async fn whoami(AuthUser(claims): AuthUser) -> String {
        claims.email
    }

    fn app(jwt: Arc<JwtHandler>) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(jwt, auth_middleware))
    }

    async fn call(app: Router, authorization: Option<&str>) -> Response {
        let mut builder = HttpRequest::builder().uri("/me");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Bearer".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Token   xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("xyz"));
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let jwt = handler();
        let token = jwt.generate_token("renter@example.com", Map::new()).unwrap();

        let response = call(app(jwt), Some(&format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"renter@example.com");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = call(app(handler()), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_header_without_credential_is_unauthorized() {
        let response = call(app(handler()), Some("Bearer")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_token_is_unauthorized() {
        let other = JwtHandler::new("some-other-secret".to_string());
        let token = other.generate_token("renter@example.com", Map::new()).unwrap();

        let response = call(app(handler()), Some(&format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_is_unauthorized() {
        let app = Router::new().route("/me", get(whoami));
        let response = call(app, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
