use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{CreateExpenseRequest, Expense};
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

pub async fn list_expenses(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Expenses).await?;
    let expenses = state.store.list_expenses(ctx.tenant.id).await?;
    Ok(Json(expenses))
}

pub async fn create_expense(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(axum::http::StatusCode, Json<Expense>), ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Expenses).await?;
    if req.description.is_empty() {
        return Err(ApiError::bad_request("description is required"));
    }
    if req.amount_cents < 0 {
        return Err(ApiError::bad_request("amount must not be negative"));
    }

    let expense = state
        .store
        .create_expense(ctx.tenant.id, auth.claims.sub, &req)
        .await?;
    Ok(created(expense))
}
