use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use super::row_helpers::map_booking_row;
use super::DomainError;
use crate::models::booking_status::*;
use crate::models::*;

pub struct BookingRepo;

impl BookingRepo {
    pub async fn list(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Vec<Booking>> {
        let rows =
            sqlx::query("SELECT * FROM bookings WHERE tenant_id = ? ORDER BY start_time DESC")
                .bind(tenant_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.iter().map(map_booking_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_booking_row))
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        req: &CreateBookingRequest,
        end_time: DateTime<Utc>,
    ) -> Result<Booking> {
        Self::insert(
            pool,
            tenant_id,
            req.service_id,
            req.staff_id,
            req.customer_id,
            req.start_time,
            end_time,
            CONFIRMED,
            req.notes.as_deref(),
        )
        .await
    }

    /// Walk-ins open directly in `seated`: the chair is occupied now.
    pub async fn create_walk_in(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        req: &SeatWalkInRequest,
        end_time: DateTime<Utc>,
    ) -> Result<Booking> {
        Self::insert(
            pool,
            tenant_id,
            req.service_id,
            req.staff_id,
            req.customer_id,
            Utc::now(),
            end_time,
            SEATED,
            req.notes.as_deref(),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        service_id: i64,
        staff_id: i64,
        customer_id: Option<i64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Booking> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (tenant_id, service_id, staff_id, customer_id, start_time, end_time, status, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(service_id)
        .bind(staff_id)
        .bind(customer_id)
        .bind(start_time)
        .bind(end_time)
        .bind(status)
        .bind(notes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, tenant_id, new_id)
            .await?
            .context("Booking not found after creation")
    }

    pub async fn seat(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Booking> {
        Self::transition(pool, tenant_id, id, SEATED).await
    }

    /// Callers check the cancellation window first; the repo only enforces
    /// the state machine.
    pub async fn cancel(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Booking> {
        Self::transition(pool, tenant_id, id, CANCELLED).await
    }

    pub async fn mark_no_show(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        id: i64,
        by: i64,
        reason: &str,
    ) -> Result<Booking> {
        let current = Self::require(pool, tenant_id, id).await?;
        if !can_transition(&current.status, NO_SHOW) {
            return Err(invalid(&current.status, NO_SHOW));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, no_show_by = ?, no_show_reason = ?, no_show_at = ?, updated_at = ?
            WHERE id = ? AND tenant_id = ? AND status = ?
            "#,
        )
        .bind(NO_SHOW)
        .bind(by)
        .bind(reason)
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .bind(&current.status)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(invalid(&current.status, NO_SHOW));
        }

        Self::require(pool, tenant_id, id).await
    }

    /// Forgiveness: the only edge out of a terminal state. The marker is
    /// cleared so the booking reads as a plain reservation again.
    pub async fn forgive(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Booking> {
        let current = Self::require(pool, tenant_id, id).await?;
        if !can_transition(&current.status, CONFIRMED) {
            return Err(invalid(&current.status, CONFIRMED));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, no_show_by = NULL, no_show_reason = NULL, no_show_at = NULL, updated_at = ?
            WHERE id = ? AND tenant_id = ? AND status = ?
            "#,
        )
        .bind(CONFIRMED)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .bind(NO_SHOW)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(invalid(&current.status, CONFIRMED));
        }

        Self::require(pool, tenant_id, id).await
    }

    /// Status-guarded transition: the WHERE clause re-checks the source
    /// state so two concurrent attempts cannot both win.
    async fn transition(pool: &Pool<Sqlite>, tenant_id: i64, id: i64, to: &str) -> Result<Booking> {
        let current = Self::require(pool, tenant_id, id).await?;
        if !can_transition(&current.status, to) {
            return Err(invalid(&current.status, to));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND tenant_id = ? AND status = ?",
        )
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .bind(&current.status)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(invalid(&current.status, to));
        }

        Self::require(pool, tenant_id, id).await
    }

    async fn require(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Booking> {
        Self::get(pool, tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id).into())
    }
}

fn invalid(from: &str, to: &str) -> anyhow::Error {
    DomainError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fixture;
    use crate::db::DomainError;
    use chrono::Duration;

    async fn confirmed_booking(fx: &crate::db::test_support::Fixture) -> Booking {
        let start = Utc::now() + Duration::hours(3);
        fx.store
            .create_booking(
                fx.tenant.id,
                &CreateBookingRequest {
                    service_id: fx.service.id,
                    staff_id: fx.staff.id,
                    customer_id: Some(fx.customer.id),
                    start_time: start,
                    notes: None,
                },
                start + Duration::minutes(fx.service.duration_minutes),
            )
            .await
            .expect("booking")
    }

    #[tokio::test]
    async fn test_seat_then_cancel_is_rejected() {
        let fx = fixture().await;
        let booking = confirmed_booking(&fx).await;

        let seated = fx.store.seat_booking(fx.tenant.id, booking.id).await.unwrap();
        assert_eq!(seated.status, SEATED);

        let err = fx
            .store
            .cancel_booking(fx.tenant.id, booking.id)
            .await
            .unwrap_err();
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::InvalidTransition { from, to }) => {
                assert_eq!(from, SEATED);
                assert_eq!(to, CANCELLED);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_show_records_marker_and_forgive_clears_it() {
        let fx = fixture().await;
        let booking = confirmed_booking(&fx).await;

        let marked = fx
            .store
            .mark_no_show(fx.tenant.id, booking.id, fx.staff.id, "client never arrived")
            .await
            .unwrap();
        assert_eq!(marked.status, NO_SHOW);
        assert_eq!(marked.no_show_by, Some(fx.staff.id));
        assert_eq!(marked.no_show_reason.as_deref(), Some("client never arrived"));
        assert!(marked.no_show_at.is_some());

        let forgiven = fx
            .store
            .forgive_no_show(fx.tenant.id, booking.id)
            .await
            .unwrap();
        assert_eq!(forgiven.status, CONFIRMED);
        assert!(forgiven.no_show_by.is_none());
        assert!(forgiven.no_show_reason.is_none());
        assert!(forgiven.no_show_at.is_none());
    }

    #[tokio::test]
    async fn test_forgive_does_not_resurrect_cancelled() {
        let fx = fixture().await;
        let booking = confirmed_booking(&fx).await;

        fx.store.cancel_booking(fx.tenant.id, booking.id).await.unwrap();
        let err = fx
            .store
            .forgive_no_show(fx.tenant.id, booking.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_foreign_tenant_sees_not_found() {
        let fx = fixture().await;
        let booking = confirmed_booking(&fx).await;

        let other = fx
            .store
            .create_tenant(&CreateTenantRequest {
                slug: "rival".to_string(),
                name: "Rival Cuts".to_string(),
                logo_url: None,
                subscription_status: "active".to_string(),
            })
            .await
            .unwrap();

        // The hostile caller supplies the victim's booking id under its own
        // tenant: indistinguishable from a missing row.
        let err = fx
            .store
            .cancel_booking(other.id, booking.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::NotFound { .. })
        ));

        let still = fx.store.get_booking(fx.tenant.id, booking.id).await.unwrap();
        assert_eq!(still.unwrap().status, CONFIRMED);
    }

    #[tokio::test]
    async fn test_walk_in_opens_seated() {
        let fx = fixture().await;
        let booking = fx
            .store
            .create_walk_in(
                fx.tenant.id,
                &SeatWalkInRequest {
                    service_id: fx.service.id,
                    staff_id: fx.staff.id,
                    customer_id: None,
                    notes: Some("walk-up".to_string()),
                },
                Utc::now() + Duration::minutes(30),
            )
            .await
            .unwrap();
        assert_eq!(booking.status, SEATED);
        assert!(booking.customer_id.is_none());
    }
}
