use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{audit_action, role, TenantSettings, UpdateTenantSettingsRequest};
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::ws::EventType;
use crate::AppState;

use super::{authorize, ApiError};

/// GET /api/settings — readable from the operational surfaces (the
/// terminal shows the cancellation buffer and kiosk state).
pub async fn get_settings(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TenantSettings>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Dashboard).await?;
    let settings = state.store.get_tenant_settings(ctx.tenant.id).await?;
    Ok(Json(settings))
}

/// PUT /api/settings — owner configuration (cancellation buffer etc.).
pub async fn update_settings(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateTenantSettingsRequest>,
) -> Result<Json<TenantSettings>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Settings).await?;

    if let Some(buffer) = req.cancellation_buffer_minutes {
        if buffer < 0 {
            return Err(ApiError::bad_request(
                "cancellation buffer must not be negative",
            ));
        }
    }
    // The kiosk flag has its own endpoint; ignore it here so the settings
    // page cannot toggle it by accident.
    let req = UpdateTenantSettingsRequest {
        kiosk_mode: None,
        ..req
    };

    let settings = state
        .store
        .update_tenant_settings(ctx.tenant.id, &req)
        .await?;
    Ok(Json(settings))
}

#[derive(Deserialize)]
pub struct KioskModeRequest {
    pub active: bool,
}

/// PUT /api/settings/kiosk — the kiosk toggle lives on the terminal
/// surface (reachable while kiosk mode is active, otherwise the mode
/// could never be turned off) and is additionally owner-only.
pub async fn set_kiosk_mode(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<KioskModeRequest>,
) -> Result<Json<TenantSettings>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;
    if auth.claims.role != role::OWNER && auth.claims.role != role::SUPER_ADMIN {
        return Err(ApiError::forbidden("owner access required", None));
    }

    let settings = state
        .store
        .update_tenant_settings(
            ctx.tenant.id,
            &UpdateTenantSettingsRequest {
                kiosk_mode: Some(req.active),
                cancellation_buffer_minutes: None,
            },
        )
        .await?;

    state
        .store
        .audit(
            ctx.tenant.id,
            auth.claims.sub,
            audit_action::KIOSK_MODE_CHANGED,
            "tenant_settings",
            ctx.tenant.id,
            serde_json::json!({ "active": req.active }),
        )
        .await;

    if let Some(hub) = &state.ws_hub {
        hub.dispatch(
            EventType::KioskModeChanged,
            ctx.tenant.id,
            serde_json::json!({ "active": req.active }),
        );
    }

    Ok(Json(settings))
}
