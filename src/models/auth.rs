use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims carried by the access token. tenant_id is None for
/// unaffiliated users and platform admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// AuthSession is one refresh-token record. The opaque token itself is
/// never stored, only its SHA-256 digest; `used` marks a rotated token so
/// replay is detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: i64,
    pub profile_id: i64,
    #[serde(skip_serializing)]
    pub token_sha256: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub display_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}
