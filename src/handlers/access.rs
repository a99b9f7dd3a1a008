use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::role;
use crate::policy::{self, AccessDecision, RouteArea};
use crate::tenancy::TenantContext;
use crate::AppState;

use super::ApiError;

#[derive(Deserialize)]
pub struct DecisionQuery {
    #[serde(default)]
    pub area: Option<RouteArea>,
}

#[derive(Serialize)]
pub struct AccessMap {
    pub kiosk_mode: bool,
    pub decisions: Vec<AreaDecision>,
}

#[derive(Serialize)]
pub struct AreaDecision {
    pub area: RouteArea,
    #[serde(flatten)]
    pub decision: AccessDecision,
}

/// GET /api/access/decision — the navigation guard's single source of
/// truth. This is UX plumbing only; every mutating handler re-runs the
/// same policy server-side, so disabling the client guard changes
/// nothing about what is permitted.
pub async fn get_access_decision(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<AccessMap>, ApiError> {
    // Foreign-tenant tokens see no decisions at all.
    if auth.claims.role != role::SUPER_ADMIN && auth.claims.tenant_id != Some(ctx.tenant.id) {
        return Err(ApiError::not_found("Tenant"));
    }

    let settings = state.store.get_tenant_settings(ctx.tenant.id).await?;

    let areas: Vec<RouteArea> = match query.area {
        Some(area) => vec![area],
        None => RouteArea::ALL.to_vec(),
    };

    let decisions = areas
        .into_iter()
        .map(|area| AreaDecision {
            area,
            decision: policy::decide(&auth.claims.role, settings.kiosk_mode, area),
        })
        .collect();

    Ok(Json(AccessMap {
        kiosk_mode: settings.kiosk_mode,
        decisions,
    }))
}
