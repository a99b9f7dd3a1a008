use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::loyalty;
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, ApiError};

#[derive(Deserialize)]
pub struct RedemptionQuery {
    #[serde(default)]
    pub amount_cents: i64,
}

#[derive(Serialize)]
pub struct RedemptionPreview {
    pub balance: i64,
    pub tier: loyalty::Tier,
    /// Whether redemption may be offered at all (threshold check).
    pub redeemable: bool,
    pub max_redeemable: i64,
    pub max_discount_cents: i64,
}

/// GET /api/loyalty/:customer_id — the terminal's redemption preview.
/// Below the threshold the offer is withheld with the reason visible in
/// the payload rather than silently clamped.
pub async fn redemption_preview(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<i64>,
    Query(query): Query<RedemptionQuery>,
) -> Result<Json<RedemptionPreview>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;

    let customer = state
        .store
        .get_profile_scoped(ctx.tenant.id, customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;

    let balance = customer.loyalty_points;
    let redeemable = balance >= loyalty::MIN_REDEEM_BALANCE;
    let max = if redeemable {
        loyalty::max_redeemable(balance, query.amount_cents)
    } else {
        0
    };

    Ok(Json(RedemptionPreview {
        balance,
        tier: loyalty::Tier::of(balance),
        redeemable,
        max_redeemable: max,
        max_discount_cents: loyalty::discount_cents(max),
    }))
}
