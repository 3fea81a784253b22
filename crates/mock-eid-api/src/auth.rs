//! Bearer tokens.
//!
//! The stub issues HS256 JWTs whose `sub` is the user id. Handlers that
//! need a caller take an [`AuthUser`] argument; extraction fails with 401
//! before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::SharedState;

/// Lifetime of issued tokens.
const TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by a stub token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Username at issue time.
    pub username: String,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
}

/// Sign a token for `user_id`.
pub fn issue_token(secret: &str, user_id: &str, username: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Check a token and return its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid Token"))
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User id from the token.
    pub user_id: String,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Auth Header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid Auth Header"))?;

        let claims = verify_token(&state.jwt_secret, token)?;
        Ok(Self {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let token = issue_token("secret", "1", "ember").unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.username, "ember");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("secret", "1", "ember").unwrap();
        assert!(matches!(
            verify_token("other", &token),
            Err(ApiError::Unauthorized("Invalid Token"))
        ));
    }
}
