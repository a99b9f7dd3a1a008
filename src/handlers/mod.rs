pub mod access;
pub mod audit;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod expenses;
pub mod loyalty;
pub mod profiles;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod tenants;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::DomainError;
use crate::models::{role, Claims, Tenant};
use crate::policy::RouteArea;
use crate::AppState;

/// Error response body. `redirect` accompanies policy denials so the
/// client can route the user; `code` carries machine-readable markers
/// such as `session_expired`.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            redirect: None,
            code: None,
        }
    }
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    redirect: Option<String>,
    code: Option<String>,
}

impl ApiError {
    fn plain(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            redirect: None,
            code: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::plain(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::plain(StatusCode::NOT_FOUND, format!("{} not found", resource))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::plain(StatusCode::CONFLICT, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::plain(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>, redirect: Option<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
            redirect,
            code: None,
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::plain(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::plain(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
            redirect: Some("/login?session_expired=1".to_string()),
            code: Some("session_expired".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                redirect: self.redirect,
                code: self.code,
            }),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Check for typed domain errors first (no fragile string matching)
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return match domain {
                DomainError::NotFound { resource, .. } => Self::not_found(resource),
                DomainError::InvalidTransition { .. } | DomainError::AlreadySettled { .. } => {
                    Self::conflict(domain.to_string())
                }
                DomainError::CancellationWindowExpired { .. }
                | DomainError::RedemptionBelowThreshold { .. }
                | DomainError::InsufficientPoints { .. } => Self::unprocessable(domain.to_string()),
                DomainError::PolicyDenied { redirect } => Self::forbidden(
                    "operation not permitted",
                    Some(redirect.clone()),
                ),
                DomainError::SessionCorrupted { reason } => Self::session_expired(reason.clone()),
                DomainError::ValidationFailed { message } => Self::bad_request(message.clone()),
            };
        }
        Self::internal(err.to_string())
    }
}

/// Message response for simple status messages
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: msg.into(),
        })
    }
}

/// Response helper: return 201 Created with JSON body
pub fn created<T: Serialize>(item: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(item))
}

/// Healthcheck endpoint — returns 200 OK with status
pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chairside",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Authoritative server-side gate, run inside every tenant-scoped
/// operation regardless of what the client navigation shows:
/// 1. the caller's token must belong to the resolved tenant (platform
///    admins excepted) — a mismatch reads as NotFound so foreign probing
///    learns nothing;
/// 2. the tenant's persisted kiosk flag is read fresh, never cached;
/// 3. the policy engine decides.
pub async fn authorize(
    state: &AppState,
    claims: &Claims,
    tenant: &Tenant,
    area: RouteArea,
) -> Result<(), ApiError> {
    if claims.role != role::SUPER_ADMIN && claims.tenant_id != Some(tenant.id) {
        return Err(ApiError::not_found("Tenant"));
    }

    let settings = state
        .store
        .get_tenant_settings(tenant.id)
        .await
        .map_err(ApiError::from)?;

    crate::policy::require(&claims.role, settings.kiosk_mode, area)
        .map_err(|e| ApiError::from(anyhow::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_support::fixture;
    use crate::models::UpdateTenantSettingsRequest;

    fn claims_for(profile: &crate::models::Profile) -> Claims {
        Claims {
            sub: profile.id,
            tenant_id: profile.tenant_id,
            role: profile.role.clone(),
            exp: 0,
            iat: 0,
        }
    }

    fn app_state(store: crate::db::Store) -> AppState {
        AppState {
            store,
            config: Config {
                db_path: String::new(),
                db_max_connections: 1,
                listen_addr: String::new(),
                jwt_secret: "test-secret".to_string(),
                access_token_ttl_minutes: 30,
                refresh_token_ttl_days: 30,
            },
            ws_hub: None,
        }
    }

    /// The server-side gate alone must be sufficient: with kiosk mode
    /// persisted, a restricted mutation is denied for every role even when
    /// no client-side navigation guard ever ran.
    #[tokio::test]
    async fn test_server_side_gate_honors_persisted_kiosk_mode() {
        let fx = fixture().await;
        let state = app_state(fx.store.clone());

        state
            .store
            .update_tenant_settings(
                fx.tenant.id,
                &UpdateTenantSettingsRequest {
                    kiosk_mode: Some(true),
                    cancellation_buffer_minutes: None,
                },
            )
            .await
            .unwrap();

        // Catalog editing is outside the kiosk allow-list — denied even
        // for the owner.
        for profile in [&fx.owner, &fx.staff] {
            let err = authorize(&state, &claims_for(profile), &fx.tenant, RouteArea::Catalog)
                .await
                .unwrap_err();
            let resp = axum::response::IntoResponse::into_response(err);
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }

        // The terminal stays reachable.
        authorize(&state, &claims_for(&fx.owner), &fx.tenant, RouteArea::Terminal)
            .await
            .unwrap();

        // The flag is read through on every decision: switching it off
        // takes effect immediately, with no cache to invalidate.
        state
            .store
            .update_tenant_settings(
                fx.tenant.id,
                &UpdateTenantSettingsRequest {
                    kiosk_mode: Some(false),
                    cancellation_buffer_minutes: None,
                },
            )
            .await
            .unwrap();
        authorize(&state, &claims_for(&fx.owner), &fx.tenant, RouteArea::Catalog)
            .await
            .unwrap();
    }

    /// Foreign-tenant tokens read as NotFound, indistinguishable from an
    /// absent tenant.
    #[tokio::test]
    async fn test_foreign_tenant_token_is_not_found() {
        let fx = fixture().await;
        let state = app_state(fx.store.clone());

        let mut claims = claims_for(&fx.owner);
        claims.tenant_id = Some(fx.tenant.id + 1);

        let err = authorize(&state, &claims, &fx.tenant, RouteArea::Dashboard)
            .await
            .unwrap_err();
        let resp = axum::response::IntoResponse::into_response(err);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
