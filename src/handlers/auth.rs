use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{
    corruption, issue_access_token, new_refresh_token, refresh_token_digest, AuthUser,
};
use crate::db::DomainError;
use crate::models::{LoginRequest, LoginResponse, RefreshRequest};
use crate::AppState;

use super::{ApiError, MessageResponse};

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let profile = state
        .store
        .get_profile_by_email(&req.email)
        .await
        .map_err(|_| ApiError::internal("database error"))?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    let valid = bcrypt::verify(&req.password, &profile.password_hash)
        .map_err(|_| ApiError::internal("password verification error"))?;

    if !valid {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let token = issue_access_token(
        profile.id,
        profile.tenant_id,
        &profile.role,
        &state.config.jwt_secret,
        state.config.access_token_ttl_minutes,
    )
    .map_err(|e| ApiError::internal(format!("token generation error: {}", e)))?;

    let refresh_token = new_refresh_token();
    let expires_at =
        chrono::Utc::now() + chrono::TimeDelta::days(state.config.refresh_token_ttl_days);
    state
        .store
        .create_auth_session(profile.id, &refresh_token_digest(&refresh_token), expires_at)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(LoginResponse {
        token,
        refresh_token,
        display_name: profile.display_name,
        role: profile.role,
        tenant_id: profile.tenant_id,
    }))
}

/// POST /api/auth/refresh
///
/// Rotation with replay detection. An unknown digest or a digest that was
/// already rotated is credential corruption: every session of the profile
/// is revoked and the caller must re-authenticate. A merely expired
/// refresh token is an ordinary 401, not corruption.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let digest = refresh_token_digest(&req.refresh_token);

    let session = state
        .store
        .get_auth_session(&digest)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            ApiError::from(anyhow::Error::from(DomainError::SessionCorrupted {
                reason: corruption::REFRESH_UNKNOWN.to_string(),
            }))
        })?;

    if session.used {
        // Replay of a rotated token: someone else holds this credential.
        if let Err(e) = state.store.revoke_auth_sessions(session.profile_id).await {
            tracing::warn!(
                "Failed to revoke sessions for profile {}: {}",
                session.profile_id,
                e
            );
        }
        tracing::warn!(
            "Refresh token replay detected for profile {}",
            session.profile_id
        );
        return Err(ApiError::from(anyhow::Error::from(
            DomainError::SessionCorrupted {
                reason: corruption::REFRESH_REUSED.to_string(),
            },
        )));
    }

    if session.expires_at < chrono::Utc::now() {
        return Err(ApiError::unauthorized("refresh token expired"));
    }

    let profile = state
        .store
        .get_profile(session.profile_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("profile no longer exists"))?;

    state
        .store
        .mark_auth_session_used(session.id)
        .await
        .map_err(ApiError::from)?;

    let token = issue_access_token(
        profile.id,
        profile.tenant_id,
        &profile.role,
        &state.config.jwt_secret,
        state.config.access_token_ttl_minutes,
    )
    .map_err(|e| ApiError::internal(format!("token generation error: {}", e)))?;

    let refresh_token = new_refresh_token();
    let expires_at =
        chrono::Utc::now() + chrono::TimeDelta::days(state.config.refresh_token_ttl_days);
    state
        .store
        .create_auth_session(profile.id, &refresh_token_digest(&refresh_token), expires_at)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(LoginResponse {
        token,
        refresh_token,
        display_name: profile.display_name,
        role: profile.role,
        tenant_id: profile.tenant_id,
    }))
}

/// POST /api/auth/logout — drops every refresh session for the caller.
pub async fn logout(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .revoke_auth_sessions(auth.claims.sub)
        .await
        .map_err(ApiError::from)?;
    Ok(MessageResponse::new("logged out"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_support::fixture;
    use crate::AppState;
    use axum::http::StatusCode;

    async fn state_with_login() -> (Arc<AppState>, LoginResponse) {
        let fx = fixture().await;
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        sqlx::query("UPDATE profiles SET password_hash = ? WHERE id = ?")
            .bind(&hash)
            .bind(fx.staff.id)
            .execute(&fx.store.pool_for_tests())
            .await
            .unwrap();

        let state = Arc::new(AppState {
            store: fx.store.clone(),
            config: Config {
                db_path: String::new(),
                db_max_connections: 1,
                listen_addr: String::new(),
                jwt_secret: "test-secret".to_string(),
                access_token_ttl_minutes: 30,
                refresh_token_ttl_days: 30,
            },
            ws_hub: None,
        });

        let Json(resp) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "staff@fadecraft.test".to_string(),
                password: "hunter2".to_string(),
            }),
        )
        .await
        .expect("login");

        (state, resp)
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_replay() {
        let (state, first) = state_with_login().await;

        // Rotation: the first refresh succeeds and issues new material.
        let Json(second) = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: first.refresh_token.clone(),
            }),
        )
        .await
        .expect("first refresh");
        assert_ne!(second.refresh_token, first.refresh_token);

        // Replaying the rotated token is corruption: session_expired is
        // signalled and every session is revoked.
        let err = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: first.refresh_token.clone(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code.as_deref(), Some("session_expired"));

        // The revocation reached the freshly rotated token too.
        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: second.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("session_expired"));
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_is_corruption() {
        let (state, _) = state_with_login().await;
        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: "not-a-token".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code.as_deref(), Some("session_expired"));
    }

    #[tokio::test]
    async fn test_expired_refresh_is_not_corruption() {
        let (state, first) = state_with_login().await;

        // Backdate the stored session: a stale token is "logged out",
        // never an attack signal.
        sqlx::query("UPDATE auth_sessions SET expires_at = datetime('now', '-1 day')")
            .execute(&state.store.pool_for_tests())
            .await
            .unwrap();

        let err = refresh(
            State(state),
            Json(RefreshRequest {
                refresh_token: first.refresh_token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, None);
    }

    #[tokio::test]
    async fn test_bad_password_is_rejected() {
        let (state, _) = state_with_login().await;
        let err = login(
            State(state),
            Json(LoginRequest {
                email: "staff@fadecraft.test".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
