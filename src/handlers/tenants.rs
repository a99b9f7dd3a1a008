use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{role, subscription_status, CreateTenantRequest, Tenant};
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

fn require_super_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.claims.role != role::SUPER_ADMIN {
        return Err(ApiError::forbidden("platform access required", None));
    }
    Ok(())
}

/// GET /api/tenant — host-resolved bootstrap for the client shell.
pub async fn current_tenant(ctx: TenantContext) -> Json<Tenant> {
    Json(ctx.tenant)
}

pub async fn list_tenants(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Tenant>>, ApiError> {
    require_super_admin(&auth)?;
    let tenants = state.store.list_tenants().await?;
    Ok(Json(tenants))
}

pub async fn get_tenant(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Tenant>, ApiError> {
    require_super_admin(&auth)?;
    let tenant = state
        .store
        .get_tenant(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))?;
    Ok(Json(tenant))
}

pub async fn create_tenant(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<(axum::http::StatusCode, Json<Tenant>), ApiError> {
    require_super_admin(&auth)?;
    if req.slug.is_empty() || req.name.is_empty() {
        return Err(ApiError::bad_request("slug and name are required"));
    }
    if !req
        .slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::bad_request(
            "slug must be lowercase letters, digits, and hyphens",
        ));
    }
    if !subscription_status::ALL.contains(&req.subscription_status.as_str()) {
        return Err(ApiError::bad_request(format!(
            "unknown subscription status: {}",
            req.subscription_status
        )));
    }

    let tenant = state.store.create_tenant(&req).await?;
    Ok(created(tenant))
}

pub async fn update_tenant(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<Json<Tenant>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Settings).await?;
    if id != ctx.tenant.id {
        return Err(ApiError::not_found("Tenant"));
    }

    let tenant = state.store.update_tenant(id, &req).await?;
    Ok(Json(tenant))
}
