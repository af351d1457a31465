// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway identity filter.
//!
//! Resolves the caller from a JWT, makes sure the directory knows them
//! (registering first-time users from their token claims) and forwards the
//! request with `X-User-ID` set to the token subject.

use crate::error::AppError;
use crate::models::RegisterRequest;
use crate::routes::USER_ID_HEADER;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie checked before the `Authorization` header.
pub const TOKEN_COOKIE: &str = "fitness_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity-provider user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// Pull the raw token from the session cookie or a bearer header.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Verify `token` and return its claims.
pub fn decode_claims(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    // Identity-provider tokens carry an audience we don't pin
    validation.validate_aud = false;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Registration request for a first-time user, built from token claims.
fn register_request_from_claims(claims: &Claims) -> Option<RegisterRequest> {
    let email = claims.email.clone()?;
    Some(RegisterRequest {
        email,
        // Credentials live with the identity provider; store an unusable value
        password: uuid::Uuid::new_v4().simple().to_string(),
        keycloak_id: Some(claims.sub.clone()),
        first_name: claims.given_name.clone().unwrap_or_default(),
        last_name: claims.family_name.clone().unwrap_or_default(),
    })
}

/// Middleware that requires a valid JWT and a directory entry for its subject.
pub async fn sync_identity(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = decode_claims(&token, &state.config.jwt_signing_key)?;
    let user_id = claims.sub.clone();

    if state.gateway_validator.validate(&user_id).await? {
        tracing::debug!(user_id = %user_id, "User already registered");
    } else {
        let register = register_request_from_claims(&claims)
            .ok_or_else(|| AppError::InvalidUser(user_id.clone()))?;
        let user = state.gateway_validator.register(&register).await?;
        tracing::info!(user_id = %user_id, directory_id = %user.id, "Registered new user from token");
    }

    let value = HeaderValue::from_str(&user_id).map_err(|_| AppError::Unauthorized)?;
    request.headers_mut().insert(USER_ID_HEADER, value);

    Ok(next.run(request).await)
}

/// Create a signed token for `sub` (local development and tests).
pub fn create_jwt(sub: &str, email: Option<&str>, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: sub.to_string(),
        iat: now,
        exp: now + 60 * 60, // 1 hour
        email: email.map(str::to_string),
        given_name: None,
        family_name: None,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    #[test]
    fn test_jwt_round_trip() {
        let token = create_jwt("kc-123", Some("a@example.com"), KEY).unwrap();
        let claims = decode_claims(&token, KEY).unwrap();

        assert_eq!(claims.sub, "kc-123");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_wrong_key_is_unauthorized() {
        let token = create_jwt("kc-123", None, KEY).unwrap();
        assert!(matches!(
            decode_claims(&token, b"another_key_that_is_32_bytes!!!"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_register_request_needs_email() {
        let token = create_jwt("kc-123", None, KEY).unwrap();
        let claims = decode_claims(&token, KEY).unwrap();
        assert!(register_request_from_claims(&claims).is_none());

        let with_email = Claims {
            email: Some("b@example.com".to_string()),
            given_name: Some("Bea".to_string()),
            ..claims
        };
        let request = register_request_from_claims(&with_email).unwrap();
        assert_eq!(request.keycloak_id.as_deref(), Some("kc-123"));
        assert_eq!(request.first_name, "Bea");
        assert_eq!(request.last_name, "");
        assert!(request.password.len() >= 6);
    }

    #[test]
    fn test_bearer_header_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(
            extract_token(&CookieJar::new(), &headers).as_deref(),
            Some("abc")
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&CookieJar::new(), &headers).is_none());
    }
}
