use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::db::DailyRevenue;
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, ApiError};

#[derive(Deserialize)]
pub struct SummaryQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

/// GET /api/reports/summary — daily revenue for the owner dashboard.
pub async fn revenue_summary(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Vec<DailyRevenue>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Reports).await?;

    let days = query.days.clamp(1, 365);
    let summary = state.store.revenue_summary(ctx.tenant.id, days).await?;
    Ok(Json(summary))
}
