use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{CreateServiceRequest, Service};
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

/// GET /api/services — both the booking portal and the terminal read the
/// catalog, so either surface being reachable grants the list.
pub async fn list_services(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, ApiError> {
    if authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Portal)
        .await
        .is_err()
    {
        authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;
    }
    let services = state.store.list_services(ctx.tenant.id).await?;
    Ok(Json(services))
}

pub async fn create_service(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(axum::http::StatusCode, Json<Service>), ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Catalog).await?;
    validate(&req)?;

    let service = state.store.create_service(ctx.tenant.id, &req).await?;
    Ok(created(service))
}

pub async fn update_service(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Catalog).await?;
    validate(&req)?;

    let service = state.store.update_service(ctx.tenant.id, id, &req).await?;
    Ok(Json(service))
}

fn validate(req: &CreateServiceRequest) -> Result<(), ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if req.price_cents < 0 {
        return Err(ApiError::bad_request("price must not be negative"));
    }
    if req.duration_minutes <= 0 {
        return Err(ApiError::bad_request("duration must be positive"));
    }
    Ok(())
}
