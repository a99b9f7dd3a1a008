use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::handlers::ErrorResponse;
use crate::models::Claims;
use crate::AppState;

/// Error signatures that mean the credential itself is corrupted or
/// replayed. A merely missing or expired session is NOT in this set —
/// "logged out" must never be treated as an attack.
pub mod corruption {
    pub const REFRESH_REUSED: &str = "refresh token already used";
    pub const REFRESH_UNKNOWN: &str = "invalid refresh token";
}

/// Extractor that validates the access token and provides the caller's
/// claims.
///
/// Add `auth: AuthUser` to a handler's parameters to require
/// authentication.
pub struct AuthUser {
    pub claims: Claims,
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Try Authorization header first, then fall back to ?token= query param
        // (WebSocket connections can't send custom headers)
        let token = if let Some(auth_header) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        {
            auth_header
                .strip_prefix("Bearer ")
                .ok_or(AuthError::InvalidToken)?
                .to_string()
        } else if let Some(query) = parts.uri.query() {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("token="))
                .ok_or(AuthError::MissingToken)?
                .to_string()
        } else {
            return Err(AuthError::MissingToken);
        };

        let claims = decode_access_token(&token, &state.config.jwt_secret)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser { claims })
    }
}

pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Issue a short-lived access token for a profile.
pub fn issue_access_token(
    profile_id: i64,
    tenant_id: Option<i64>,
    role: &str,
    secret: &str,
    ttl_minutes: i64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::TimeDelta::minutes(ttl_minutes);

    let claims = Claims {
        sub: profile_id,
        tenant_id,
        role: role.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(data.claims)
}

/// Generate opaque refresh-token material: 32 random bytes, hex-encoded.
pub fn new_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Digest used to store and look up refresh tokens; the raw token never
/// touches the database.
pub fn refresh_token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let token = issue_access_token(7, Some(3), "staff", "test-secret", 30).unwrap();
        let claims = decode_access_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.tenant_id, Some(3));
        assert_eq!(claims.role, "staff");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_access_token(7, None, "owner", "secret-a", 30).unwrap();
        assert!(decode_access_token(&token, "secret-b").is_err());
    }

    #[test]
    fn test_refresh_token_material() {
        let a = new_refresh_token();
        let b = new_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        // Digest is deterministic and distinct from the token itself.
        assert_eq!(refresh_token_digest(&a), refresh_token_digest(&a));
        assert_ne!(refresh_token_digest(&a), a);
    }
}
