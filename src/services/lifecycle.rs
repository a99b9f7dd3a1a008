//! Booking lifecycle service: wraps the repo transitions with the
//! cancellation-window guard, audit entries, and realtime notifications.

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

use crate::db::{DomainError, Store};
use crate::models::{audit_action, Booking, CreateBookingRequest, SeatWalkInRequest};
use crate::ws::{EventType, Hub};

/// The buffer guard is a pure wall-clock comparison. It is always
/// consulted; a deployment that wants no buffer sets the tenant's
/// configuration to zero explicitly.
pub fn cancellable(start_time: DateTime<Utc>, now: DateTime<Utc>, buffer_minutes: i64) -> bool {
    start_time - now >= TimeDelta::minutes(buffer_minutes)
}

pub async fn create_booking(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    req: &CreateBookingRequest,
) -> Result<Booking> {
    let service = store
        .get_service(tenant_id, req.service_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Service", req.service_id))?;
    if !service.active {
        return Err(DomainError::validation("service is not active").into());
    }
    store
        .get_profile_scoped(tenant_id, req.staff_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Profile", req.staff_id))?;
    if let Some(customer_id) = req.customer_id {
        store
            .get_profile_scoped(tenant_id, customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", customer_id))?;
    }

    let end_time = req.start_time + TimeDelta::minutes(service.duration_minutes);
    let booking = store.create_booking(tenant_id, req, end_time).await?;

    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_CREATED,
            "bookings",
            booking.id,
            serde_json::json!({ "service_id": booking.service_id, "staff_id": booking.staff_id }),
        )
        .await;
    notify(hub, EventType::BookingCreated, &booking);
    Ok(booking)
}

pub async fn seat_walk_in(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    req: &SeatWalkInRequest,
) -> Result<Booking> {
    let service = store
        .get_service(tenant_id, req.service_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Service", req.service_id))?;
    store
        .get_profile_scoped(tenant_id, req.staff_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Profile", req.staff_id))?;

    let end_time = Utc::now() + TimeDelta::minutes(service.duration_minutes);
    let booking = store.create_walk_in(tenant_id, req, end_time).await?;

    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_SEATED,
            "bookings",
            booking.id,
            serde_json::json!({ "walk_in": true }),
        )
        .await;
    notify(hub, EventType::BookingSeated, &booking);
    Ok(booking)
}

pub async fn seat(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    booking_id: i64,
) -> Result<Booking> {
    let booking = store.seat_booking(tenant_id, booking_id).await?;
    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_SEATED,
            "bookings",
            booking.id,
            serde_json::json!({ "walk_in": false }),
        )
        .await;
    notify(hub, EventType::BookingSeated, &booking);
    Ok(booking)
}

pub async fn cancel(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    booking_id: i64,
) -> Result<Booking> {
    let booking = store
        .get_booking(tenant_id, booking_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;

    // State first, window second: cancelling a settled or already-closed
    // booking is a lifecycle violation, not a timing problem.
    if !crate::models::booking_status::can_transition(
        &booking.status,
        crate::models::booking_status::CANCELLED,
    ) {
        return Err(DomainError::InvalidTransition {
            from: booking.status,
            to: crate::models::booking_status::CANCELLED.to_string(),
        }
        .into());
    }

    let settings = store.get_tenant_settings(tenant_id).await?;
    if !cancellable(
        booking.start_time,
        Utc::now(),
        settings.cancellation_buffer_minutes,
    ) {
        return Err(DomainError::CancellationWindowExpired {
            buffer_minutes: settings.cancellation_buffer_minutes,
        }
        .into());
    }

    let booking = store.cancel_booking(tenant_id, booking_id).await?;
    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_CANCELLED,
            "bookings",
            booking.id,
            serde_json::json!({}),
        )
        .await;
    notify(hub, EventType::BookingCancelled, &booking);
    Ok(booking)
}

pub async fn mark_no_show(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    booking_id: i64,
    reason: &str,
) -> Result<Booking> {
    if reason.trim().is_empty() {
        return Err(DomainError::validation("a no-show reason is required").into());
    }

    let booking = store
        .mark_no_show(tenant_id, booking_id, actor_id, reason)
        .await?;
    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_NO_SHOW,
            "bookings",
            booking.id,
            serde_json::json!({ "reason": reason }),
        )
        .await;
    notify(hub, EventType::BookingNoShow, &booking);
    Ok(booking)
}

pub async fn forgive_no_show(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    booking_id: i64,
) -> Result<Booking> {
    let booking = store.forgive_no_show(tenant_id, booking_id).await?;
    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::BOOKING_FORGIVEN,
            "bookings",
            booking.id,
            serde_json::json!({}),
        )
        .await;
    notify(hub, EventType::BookingForgiven, &booking);
    Ok(booking)
}

fn notify(hub: Option<&Arc<Hub>>, event_type: EventType, booking: &Booking) {
    if let Some(hub) = hub {
        hub.dispatch(
            event_type,
            booking.tenant_id,
            serde_json::json!({
                "booking_id": booking.id,
                "status": booking.status,
                "staff_id": booking.staff_id,
                "start_time": booking.start_time,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fixture;
    use crate::models::booking_status;
    use chrono::Duration;

    #[test]
    fn test_cancellable_window_math() {
        let now = Utc::now();
        assert!(cancellable(now + Duration::hours(3), now, 120));
        assert!(!cancellable(now + Duration::hours(1), now, 120));
        assert!(cancellable(now + Duration::minutes(120), now, 120));
        // A zero buffer still runs the guard; only past bookings fail.
        assert!(cancellable(now + Duration::minutes(1), now, 0));
        assert!(!cancellable(now - Duration::minutes(1), now, 0));
    }

    async fn booking_starting_in(
        fx: &crate::db::test_support::Fixture,
        hours: i64,
    ) -> crate::models::Booking {
        let start = Utc::now() + Duration::hours(hours);
        create_booking(
            &fx.store,
            None,
            fx.tenant.id,
            fx.customer.id,
            &CreateBookingRequest {
                service_id: fx.service.id,
                staff_id: fx.staff.id,
                customer_id: Some(fx.customer.id),
                start_time: start,
                notes: None,
            },
        )
        .await
        .expect("booking")
    }

    #[tokio::test]
    async fn test_cancel_inside_buffer_fails_outside_succeeds() {
        let fx = fixture().await;

        // Default buffer is 120 minutes. One hour out: refused.
        let near = booking_starting_in(&fx, 1).await;
        let err = cancel(&fx.store, None, fx.tenant.id, fx.customer.id, near.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::CancellationWindowExpired { buffer_minutes: 120 })
        ));
        let still = fx.store.get_booking(fx.tenant.id, near.id).await.unwrap();
        assert_eq!(still.unwrap().status, booking_status::CONFIRMED);

        // Three hours out: cancels cleanly.
        let far = booking_starting_in(&fx, 3).await;
        let cancelled = cancel(&fx.store, None, fx.tenant.id, fx.customer.id, far.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, booking_status::CANCELLED);
    }

    #[tokio::test]
    async fn test_no_show_requires_reason() {
        let fx = fixture().await;
        let booking = booking_starting_in(&fx, 2).await;
        let err = mark_no_show(&fx.store, None, fx.tenant.id, fx.staff.id, booking.id, "  ")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_transitions_append_audit_entries() {
        let fx = fixture().await;
        let booking = booking_starting_in(&fx, 3).await;
        cancel(&fx.store, None, fx.tenant.id, fx.owner.id, booking.id)
            .await
            .unwrap();

        let entries = fx.store.list_audit_entries(fx.tenant.id, 10).await.unwrap();
        let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
        assert!(actions.contains(&"booking_created"));
        assert!(actions.contains(&"booking_cancelled"));
    }
}
