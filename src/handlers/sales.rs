use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{audit_action, SaleTransaction, SettleRequest};
use crate::policy::RouteArea;
use crate::services::settlement;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

/// POST /api/sales — the settle operation. Scheduled bookings complete;
/// bare requests open a walk-in ghost booking. Financial failures are
/// unambiguous: an error here means the sale was not recorded.
pub async fn settle(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SettleRequest>,
) -> Result<(axum::http::StatusCode, Json<SaleTransaction>), ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;

    let sale = settlement::settle(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        &req,
    )
    .await?;
    Ok(created(sale))
}

/// GET /api/sales — financial history is an owner surface.
pub async fn list_sales(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SaleTransaction>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Reports).await?;
    let sales = state.store.list_sales(ctx.tenant.id).await?;
    Ok(Json(sales))
}

/// GET /api/sales/:id
pub async fn get_sale(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SaleTransaction>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Reports).await?;
    let sale = state
        .store
        .get_sale(ctx.tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction"))?;
    Ok(Json(sale))
}

/// POST /api/sales/:id/void — reversal marker; the ledger row survives.
pub async fn void_sale(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SaleTransaction>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Reports).await?;

    let sale = state.store.void_sale(ctx.tenant.id, id).await?;

    state
        .store
        .audit(
            ctx.tenant.id,
            auth.claims.sub,
            audit_action::SALE_VOIDED,
            "sale_transactions",
            sale.id,
            serde_json::json!({ "amount_cents": sale.amount_cents }),
        )
        .await;

    Ok(Json(sale))
}
