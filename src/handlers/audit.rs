use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::AuditEntry;
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, ApiError};

#[derive(Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
}

fn default_limit() -> i32 {
    100
}

/// GET /api/audit — the append-only trail, owner-only.
pub async fn list_audit_entries(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::AuditLog).await?;

    let limit = query.limit.clamp(1, 1000);
    let entries = state.store.list_audit_entries(ctx.tenant.id, limit).await?;
    Ok(Json(entries))
}
