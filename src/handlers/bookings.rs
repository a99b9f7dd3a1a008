use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::models::{
    role, Booking, CreateBookingRequest, MarkNoShowRequest, SeatWalkInRequest,
};
use crate::policy::RouteArea;
use crate::services::lifecycle;
use crate::tenancy::TenantContext;
use crate::AppState;

use super::{authorize, created, ApiError};

/// Customers operate through the portal on their own bookings; staff and
/// owners operate through the schedule.
fn booking_area(actor_role: &str) -> RouteArea {
    if actor_role == role::CUSTOMER {
        RouteArea::Portal
    } else {
        RouteArea::Schedule
    }
}

pub async fn list_bookings(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, booking_area(&auth.claims.role)).await?;

    let bookings = state.store.list_bookings(ctx.tenant.id).await?;
    if auth.claims.role == role::CUSTOMER {
        return Ok(Json(
            bookings
                .into_iter()
                .filter(|b| b.customer_id == Some(auth.claims.sub))
                .collect(),
        ));
    }
    Ok(Json(bookings))
}

pub async fn get_booking(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, booking_area(&auth.claims.role)).await?;

    let booking = state
        .store
        .get_booking(ctx.tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking"))?;

    if auth.claims.role == role::CUSTOMER && booking.customer_id != Some(auth.claims.sub) {
        return Err(ApiError::not_found("Booking"));
    }
    Ok(Json(booking))
}

/// POST /api/bookings
pub async fn create_booking(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateBookingRequest>,
) -> Result<(axum::http::StatusCode, Json<Booking>), ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, booking_area(&auth.claims.role)).await?;

    // Customers book for themselves, whatever the payload claims.
    if auth.claims.role == role::CUSTOMER {
        req.customer_id = Some(auth.claims.sub);
    }

    let booking = lifecycle::create_booking(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        &req,
    )
    .await?;
    Ok(created(booking))
}

/// POST /api/bookings/walk-in — opens a seated booking at the terminal.
pub async fn seat_walk_in(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeatWalkInRequest>,
) -> Result<(axum::http::StatusCode, Json<Booking>), ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;

    let booking = lifecycle::seat_walk_in(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        &req,
    )
    .await?;
    Ok(created(booking))
}

/// POST /api/bookings/:id/seat — opens a scheduled booking at the terminal.
pub async fn seat_booking(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Terminal).await?;

    let booking = lifecycle::seat(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        id,
    )
    .await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, booking_area(&auth.claims.role)).await?;

    if auth.claims.role == role::CUSTOMER {
        let booking = state
            .store
            .get_booking(ctx.tenant.id, id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking"))?;
        if booking.customer_id != Some(auth.claims.sub) {
            return Err(ApiError::not_found("Booking"));
        }
    }

    let booking = lifecycle::cancel(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        id,
    )
    .await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/no-show — staff-side only; the schedule surface
/// is already unreachable for customers.
pub async fn mark_no_show(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<MarkNoShowRequest>,
) -> Result<Json<Booking>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Schedule).await?;

    let booking = lifecycle::mark_no_show(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        id,
        &req.reason,
    )
    .await?;
    Ok(Json(booking))
}

/// POST /api/bookings/:id/forgive
pub async fn forgive_no_show(
    auth: AuthUser,
    ctx: TenantContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    authorize(&state, &auth.claims, &ctx.tenant, RouteArea::Schedule).await?;

    let booking = lifecycle::forgive_no_show(
        &state.store,
        state.ws_hub.as_ref(),
        ctx.tenant.id,
        auth.claims.sub,
        id,
    )
    .await?;
    Ok(Json(booking))
}
