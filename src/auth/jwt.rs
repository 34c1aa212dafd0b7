//! JWT Token Handler
//! Mission: Generate and validate identity tokens with a fixed one-hour lifetime

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Tokens expire this long after issuance
pub const TOKEN_LIFETIME_HOURS: i64 = 1;

/// Claim names the handler owns; caller-supplied values are dropped
const RESERVED_CLAIMS: [&str; 3] = ["email", "iat", "exp"];

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    expiration_hours: i64,
}

/// Why a token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration_hours: TOKEN_LIFETIME_HOURS,
        }
    }

    /// Sign a token for `email`, carrying any extra claims along
    pub fn generate_token(&self, email: &str, extra: Map<String, Value>) -> Result<String> {
        self.generate_token_at(email, extra, Utc::now())
    }

    /// Same as [`generate_token`](Self::generate_token) with an explicit issuance time
    pub fn generate_token_at(
        &self,
        email: &str,
        mut extra: Map<String, Value>,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let expiration = issued_at
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?;

        for claim in RESERVED_CLAIMS {
            extra.remove(claim);
        }

        let claims = Claims {
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            extra,
        };

        debug!(
            "Generating JWT for {}, expires in {}h",
            email, self.expiration_hours
        );

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Audience is an ordinary caller claim here, never a restriction
        validation.validate_aud = false;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        debug!("Validated JWT for {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}
