// Copyright 2025 Benchcom Contributors
// SPDX-License-Identifier: Apache-2.0

//! Authentication: argon2 password hashing, HS256 bearer tokens and
//! the request extractors handlers use to identify the caller.
//!
//! [`AuthUser`] rejects with 401 when the token is missing, invalid or
//! belongs to an inactive user. [`MaybeAuthUser`] never rejects; any
//! authentication failure degrades to an anonymous caller.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use benchcom_core::settings::AuthSettings;
use benchcom_storage::users::User;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims: subject is the user id, expiry from settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Hash a password into an argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::internal("Password hashing failed"))
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Issue an HS256 bearer token for a user.
pub fn create_token(user_id: i64, auth: &AuthSettings) -> Result<String, ApiError> {
    let exp = chrono::Utc::now() + chrono::Duration::minutes(auth.token_expiry_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|_| ApiError::internal("Token creation failed"))
}

/// Decode a bearer token into a user id, validating the signature and
/// expiry.
pub fn decode_user_id(token: &str, auth: &AuthSettings) -> Option<i64> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    data.claims.sub.parse().ok()
}

/// Resolve the caller from the Authorization header.
///
/// `Ok(None)` means no credentials were presented; `Err` means
/// credentials were presented but are unusable.
async fn authenticate(parts: &Parts, state: &Arc<AppState>) -> Result<Option<User>, ApiError> {
    let Some(header) = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    let user_id = decode_user_id(token, &state.settings.auth)
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

    Ok(Some(user))
}

/// Extractor requiring an authenticated, active user.
pub struct AuthUser(pub User);

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await?
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Extractor for optional authentication.
pub struct MaybeAuthUser(pub Option<User>);

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            authenticate(parts, state).await.ok().flatten(),
        ))
    }
}

/// Reject anonymous browsing when settings require authentication.
pub fn require_browsing(state: &AppState, user: &Option<User>) -> Result<(), ApiError> {
    if !state.settings.auth.allow_anonymous_browsing && user.is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".to_string(),
            token_expiry_minutes: 30,
            allow_anonymous_submissions: true,
            allow_anonymous_browsing: true,
        }
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("password123").unwrap();
        let b = hash_password("password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_round_trip() {
        let settings = auth_settings();
        let token = create_token(42, &settings).unwrap();
        assert_eq!(decode_user_id(&token, &settings), Some(42));
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = create_token(42, &auth_settings()).unwrap();
        let mut other = auth_settings();
        other.jwt_secret = "different-secret".to_string();
        assert_eq!(decode_user_id(&token, &other), None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut settings = auth_settings();
        settings.token_expiry_minutes = -5;
        let token = create_token(42, &settings).unwrap();
        assert_eq!(decode_user_id(&token, &settings), None);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert_eq!(decode_user_id("not-a-jwt", &auth_settings()), None);
    }
}
