use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{audit_action, role, CreateProfileRequest, GrantRoleRequest, Profile};
use crate::policy::RouteArea;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

/// POST /api/signup — customer self-registration under the resolved shop.
pub async fn signup(
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateProfileRequest>,
) -> Result<(axum::http::StatusCode, Json<Profile>), ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }
    // Self-service accounts are always customers; staff roles come from an
    // explicit grant by the owner.
    req.role = role::CUSTOMER.to_string();
    req.is_active_barber = false;

    if state
        .store
        .get_profile_by_email(&req.email)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::conflict("email is already registered"));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|_| ApiError::internal("password hashing error"))?;

    let profile = state
        .store
        .create_profile(Some(ctx.tenant.id), &req, &password_hash)
        .await?;
    Ok(created(profile))
}

/// GET /api/customers — reachable by staff; part of the staff allow-list.
pub async fn list_customers(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Customers).await?;
    let profiles = state.store.list_profiles(ctx.tenant.id).await?;
    Ok(Json(
        profiles
            .into_iter()
            .filter(|p| p.role == role::CUSTOMER)
            .collect(),
    ))
}

/// GET /api/team — owner-only surface.
pub async fn list_team(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Team).await?;
    let profiles = state.store.list_profiles(ctx.tenant.id).await?;
    Ok(Json(
        profiles
            .into_iter()
            .filter(|p| p.role != role::CUSTOMER)
            .collect(),
    ))
}

/// PUT /api/team/:id/role — the explicit grant operation; the only path
/// that mutates role and tenant affiliation.
pub async fn grant_role(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<GrantRoleRequest>,
) -> Result<Json<Profile>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Team).await?;

    if !role::ALL.contains(&req.role.as_str()) {
        return Err(ApiError::bad_request(format!("unknown role: {}", req.role)));
    }
    // Nobody grants platform access through a shop surface.
    if req.role == role::SUPER_ADMIN && auth.claims.role != role::SUPER_ADMIN {
        return Err(ApiError::forbidden("cannot grant platform role", None));
    }

    let profile = state.store.grant_role(ctx.tenant.id, id, &req).await?;

    state
        .store
        .audit(
            ctx.tenant.id,
            auth.claims.sub,
            audit_action::ROLE_GRANTED,
            "profiles",
            profile.id,
            serde_json::json!({ "role": profile.role }),
        )
        .await;

    Ok(Json(profile))
}
