// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::{User, UserId};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie set by the frontend after login.
pub const SESSION_COOKIE: &str = "third_spaces_token";
/// Header the frontend sends the session token in.
pub const TOKEN_HEADER: &str = "x-auth-token";

const SESSION_LIFETIME_SECS: usize = 7 * 24 * 60 * 60;

/// JWT claims structure. Field names are camelCase on the wire
/// (`isAdmin`, `firstName`, `lastName`).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user document ID)
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub first_name: String,
    pub last_name: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    /// As of token issue; admin routes re-check the stored flag.
    pub is_admin: bool,
}

fn token_from_request(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token.to_string());
    }
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Validate a session token and return its claims.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::Unauthorized
        })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_request(&jar, request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = decode_jwt(&token, &state.config.jwt_signing_key)?;

    // Disabling an account revokes its outstanding sessions.
    match state.db.get_user(&claims.sub).await? {
        Some(user) if user.is_disabled => {
            tracing::debug!(user_id = %claims.sub, "Session of disabled account rejected");
            return Err(AppError::Forbidden(
                "account_disabled",
                "Account is disabled".to_string(),
            ));
        }
        Some(_) => {}
        None => return Err(AppError::Unauthorized),
    }

    let auth_user = AuthUser {
        id: claims.sub,
        is_admin: claims.is_admin,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user: &User, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        iat: now,
        exp: now + SESSION_LIFETIME_SECS,
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
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    fn user() -> User {
        let mut user = User::new(
            "u1".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        );
        user.is_admin = true;
        user
    }

    #[test]
    fn test_jwt_round_trip_claims() {
        let token = create_jwt(&user(), KEY).unwrap();
        let claims = decode_jwt(&token, KEY).unwrap();

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ada@example.com");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, SESSION_LIFETIME_SECS);
    }

    #[test]
    fn test_claims_use_camel_case_names() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

        let token = create_jwt(&user(), KEY).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims["sub"], "u1");
        assert_eq!(claims["isAdmin"], true);
        assert_eq!(claims["firstName"], "Ada");
        assert_eq!(claims["lastName"], "Lovelace");
        assert!(claims.get("is_admin").is_none());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt(&user(), KEY).unwrap();
        assert!(matches!(
            decode_jwt(&token, b"another_key_entirely_32_bytes!!!"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_token_sources() {
        let mut headers = HeaderMap::new();
        let empty = CookieJar::new();
        assert_eq!(token_from_request(&empty, &headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(
            token_from_request(&empty, &headers).as_deref(),
            Some("from-bearer")
        );

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        assert_eq!(
            token_from_request(&jar, &headers).as_deref(),
            Some("from-cookie")
        );

        headers.insert(TOKEN_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(
            token_from_request(&jar, &headers).as_deref(),
            Some("from-header")
        );
    }
}
