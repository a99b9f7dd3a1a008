//! Settlement engine: turns a completed lifecycle unit into a sale,
//! computing loyalty accrual/redemption, atomically with the booking
//! transition. The db layer owns the transactional boundary; this module
//! owns validation, loyalty math, auditing, and the non-blocking notify.

use anyhow::Result;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;

use crate::db::{DomainError, SettleArgs, Store};
use crate::loyalty;
use crate::models::{audit_action, payment_method, SaleTransaction, SettleRequest};
use crate::ws::{EventType, Hub};

/// Settle a sale for the given tenant. With `req.booking_id` this
/// completes a scheduled/seated booking; without it a ghost booking is
/// materialized so walk-in occupancy reporting stays consistent.
///
/// Everything the database writes commits as one unit or not at all; the
/// realtime notification fires only after commit and never affects the
/// outcome.
pub async fn settle(
    store: &Store,
    hub: Option<&Arc<Hub>>,
    tenant_id: i64,
    actor_id: i64,
    req: &SettleRequest,
) -> Result<SaleTransaction> {
    if !payment_method::ALL.contains(&req.payment_method.as_str()) {
        return Err(DomainError::validation(format!(
            "unknown payment method: {}",
            req.payment_method
        ))
        .into());
    }

    let staff = store
        .get_profile_scoped(tenant_id, req.staff_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Profile", req.staff_id))?;

    let service = store
        .get_service(tenant_id, req.service_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Service", req.service_id))?;
    if !service.active {
        return Err(DomainError::validation("service is not active").into());
    }

    let gross = req.amount_cents.unwrap_or(service.price_cents);
    if gross < 0 {
        return Err(DomainError::validation("amount must not be negative").into());
    }

    // Loyalty: redemption bounds check against the live balance, accrual
    // on the cash portion only. Both need a tenant-scoped customer row.
    let customer = match req.customer_id {
        Some(id) => Some(
            store
                .get_profile_scoped(tenant_id, id)
                .await?
                .ok_or_else(|| DomainError::not_found("Profile", id))?,
        ),
        None => None,
    };

    let redeem = req.redeem_points.unwrap_or(0);
    let discount = match (&customer, redeem) {
        (_, r) if r <= 0 => 0,
        (None, _) => {
            return Err(DomainError::validation("redemption requires a customer").into());
        }
        (Some(c), r) => loyalty::validate_redemption(c.loyalty_points, r, gross)?,
    };

    let net = gross - discount;
    let points_earned = customer
        .as_ref()
        .map(|c| loyalty::points_earned(net, loyalty::Tier::of(c.loyalty_points)))
        .unwrap_or(0);

    let now = Utc::now();
    let args = SettleArgs {
        tenant_id,
        booking_id: req.booking_id,
        ghost_start: now,
        ghost_end: now + TimeDelta::minutes(service.duration_minutes),
        staff_id: staff.id,
        service_id: service.id,
        customer_id: customer.as_ref().map(|c| c.id),
        amount_cents: net,
        payment_method: &req.payment_method,
        points_earned,
        points_redeemed: redeem.max(0),
    };

    let sale = store.settle(&args).await?;

    store
        .audit(
            tenant_id,
            actor_id,
            audit_action::POS_SALE,
            "bookings",
            sale.booking_id,
            serde_json::json!({
                "amount_cents": sale.amount_cents,
                "payment_method": sale.payment_method,
                "points_earned": sale.points_earned,
                "points_redeemed": sale.points_redeemed,
            }),
        )
        .await;

    if let Some(hub) = hub {
        hub.dispatch(
            EventType::SaleCompleted,
            tenant_id,
            serde_json::json!({
                "sale_id": sale.id,
                "booking_id": sale.booking_id,
                "staff_id": sale.staff_id,
                "amount_cents": sale.amount_cents,
            }),
        );
    }

    Ok(sale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{fixture, set_points};
    use crate::models::booking_status;
    use crate::models::CreateBookingRequest;
    use chrono::Duration;

    fn walk_in(fx: &crate::db::test_support::Fixture, redeem: Option<i64>) -> SettleRequest {
        SettleRequest {
            booking_id: None,
            staff_id: fx.staff.id,
            service_id: fx.service.id,
            amount_cents: None,
            payment_method: "cash".to_string(),
            customer_id: Some(fx.customer.id),
            redeem_points: redeem,
        }
    }

    #[tokio::test]
    async fn test_silver_walk_in_scenario() {
        // $200 service, 600-point silver customer redeems 200 points:
        // $20 discount, $180 charged, 270 points earned, balance 670.
        let fx = fixture().await;
        set_points(&fx.store, fx.customer.id, 600).await;

        let sale = settle(&fx.store, None, fx.tenant.id, fx.staff.id, &walk_in(&fx, Some(200)))
            .await
            .unwrap();

        assert_eq!(sale.amount_cents, 18_000);
        assert_eq!(sale.points_redeemed, 200);
        assert_eq!(sale.points_earned, 270);

        let customer = fx.store.get_profile(fx.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.loyalty_points, 670);

        // The ghost booking exists, already completed, spanning the
        // service duration.
        let booking = fx
            .store
            .get_booking(fx.tenant.id, sale.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, booking_status::COMPLETED);
        assert_eq!(
            (booking.end_time - booking.start_time).num_minutes(),
            fx.service.duration_minutes
        );
    }

    #[tokio::test]
    async fn test_scheduled_settlement_is_idempotent() {
        let fx = fixture().await;
        let start = Utc::now() + Duration::hours(2);
        let booking = fx
            .store
            .create_booking(
                fx.tenant.id,
                &CreateBookingRequest {
                    service_id: fx.service.id,
                    staff_id: fx.staff.id,
                    customer_id: Some(fx.customer.id),
                    start_time: start,
                    notes: None,
                },
                start + Duration::minutes(30),
            )
            .await
            .unwrap();

        let mut req = walk_in(&fx, None);
        req.booking_id = Some(booking.id);

        let sale = settle(&fx.store, None, fx.tenant.id, fx.staff.id, &req)
            .await
            .unwrap();
        // Amount defaults to the service price.
        assert_eq!(sale.amount_cents, fx.service.price_cents);
        assert_eq!(sale.booking_id, booking.id);

        // Second settlement attempt is rejected deterministically.
        let err = settle(&fx.store, None, fx.tenant.id, fx.staff.id, &req)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::AlreadySettled { .. })
        ));

        // Exactly one transaction exists for the booking.
        let sales = fx.store.list_sales(fx.tenant.id).await.unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[tokio::test]
    async fn test_redemption_below_threshold_refused_but_sale_can_proceed() {
        let fx = fixture().await;
        set_points(&fx.store, fx.customer.id, 50).await;

        let err = settle(&fx.store, None, fx.tenant.id, fx.staff.id, &walk_in(&fx, Some(50)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::RedemptionBelowThreshold { balance: 50 })
        ));
        // No partial state: nothing was sold.
        assert!(fx.store.list_sales(fx.tenant.id).await.unwrap().is_empty());

        // The same sale without redemption succeeds.
        let sale = settle(&fx.store, None, fx.tenant.id, fx.staff.id, &walk_in(&fx, None))
            .await
            .unwrap();
        assert_eq!(sale.points_redeemed, 0);
    }

    #[tokio::test]
    async fn test_failed_settlement_leaves_no_partial_state() {
        // Drive the db-level guard directly: redeeming more points than
        // the balance must roll back the booking completion too.
        let fx = fixture().await;
        set_points(&fx.store, fx.customer.id, 100).await;
        let start = Utc::now() + Duration::hours(2);
        let booking = fx
            .store
            .create_booking(
                fx.tenant.id,
                &CreateBookingRequest {
                    service_id: fx.service.id,
                    staff_id: fx.staff.id,
                    customer_id: Some(fx.customer.id),
                    start_time: start,
                    notes: None,
                },
                start + Duration::minutes(30),
            )
            .await
            .unwrap();

        let now = Utc::now();
        let args = SettleArgs {
            tenant_id: fx.tenant.id,
            booking_id: Some(booking.id),
            ghost_start: now,
            ghost_end: now,
            staff_id: fx.staff.id,
            service_id: fx.service.id,
            customer_id: Some(fx.customer.id),
            amount_cents: 1_000,
            payment_method: "cash",
            points_earned: 0,
            points_redeemed: 500,
        };
        let err = fx.store.settle(&args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InsufficientPoints { .. })
        ));

        // The booking transition rolled back with the failed point write.
        let booking = fx
            .store
            .get_booking(fx.tenant.id, booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, booking_status::CONFIRMED);
        assert!(fx.store.list_sales(fx.tenant.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settlement_is_tenant_scoped() {
        let fx = fixture().await;
        let other = fx
            .store
            .create_tenant(&crate::models::CreateTenantRequest {
                slug: "rival".to_string(),
                name: "Rival Cuts".to_string(),
                logo_url: None,
                subscription_status: "active".to_string(),
            })
            .await
            .unwrap();

        // Hostile caller supplies tenant A's staff/service ids under
        // tenant B: merged into NotFound.
        let err = settle(&fx.store, None, other.id, fx.staff.id, &walk_in(&fx, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound { .. })
        ));
    }
}
