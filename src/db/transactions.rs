use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use super::row_helpers::map_sale_row;
use super::{DailyRevenue, DomainError};
use crate::models::booking_status;
use crate::models::sale_status;
use crate::models::SaleTransaction;

/// Inputs for the atomic settlement write. The engine has already resolved
/// amounts and loyalty math; this layer owns the transactional boundary.
#[derive(Debug)]
pub struct SettleArgs<'a> {
    pub tenant_id: i64,
    /// Some: complete this scheduled/seated booking. None: materialize a
    /// walk-in ghost booking spanning [ghost_start, ghost_end].
    pub booking_id: Option<i64>,
    pub ghost_start: DateTime<Utc>,
    pub ghost_end: DateTime<Utc>,
    pub staff_id: i64,
    pub service_id: i64,
    pub customer_id: Option<i64>,
    /// Effective charge collected after redemption discount.
    pub amount_cents: i64,
    pub payment_method: &'a str,
    pub points_earned: i64,
    pub points_redeemed: i64,
}

pub struct SaleRepo;

impl SaleRepo {
    /// One sqlx transaction covers the lifecycle transition (or ghost
    /// insert), both loyalty adjustments, and the ledger insert. Any error
    /// rolls the whole unit back; no observer sees a completed booking
    /// without its sale or vice versa.
    pub async fn settle(pool: &Pool<Sqlite>, args: &SettleArgs<'_>) -> Result<SaleTransaction> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let booking_id = match args.booking_id {
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE bookings SET status = ?, updated_at = ?
                    WHERE id = ? AND tenant_id = ? AND status IN (?, ?)
                    "#,
                )
                .bind(booking_status::COMPLETED)
                .bind(now)
                .bind(id)
                .bind(args.tenant_id)
                .bind(booking_status::CONFIRMED)
                .bind(booking_status::SEATED)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    // Distinguish absent, already-settled, and other states
                    // without leaking foreign-tenant rows.
                    let row = sqlx::query("SELECT status FROM bookings WHERE id = ? AND tenant_id = ?")
                        .bind(id)
                        .bind(args.tenant_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                    let err: anyhow::Error = match row {
                        None => DomainError::not_found("Booking", id).into(),
                        Some(r) => {
                            let status: String = r.get("status");
                            if status == booking_status::COMPLETED {
                                DomainError::AlreadySettled { booking_id: id }.into()
                            } else {
                                DomainError::InvalidTransition {
                                    from: status,
                                    to: booking_status::COMPLETED.to_string(),
                                }
                                .into()
                            }
                        }
                    };
                    return Err(err);
                }
                id
            }
            None => {
                // Ghost booking: already completed, spanning the service
                // duration from now, so occupancy reporting stays whole.
                let result = sqlx::query(
                    r#"
                    INSERT INTO bookings (tenant_id, service_id, staff_id, customer_id, start_time, end_time, status, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(args.tenant_id)
                .bind(args.service_id)
                .bind(args.staff_id)
                .bind(args.customer_id)
                .bind(args.ghost_start)
                .bind(args.ghost_end)
                .bind(booking_status::COMPLETED)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                result.last_insert_rowid()
            }
        };

        if args.points_redeemed > 0 {
            let customer_id = args
                .customer_id
                .ok_or_else(|| DomainError::validation("redemption requires a customer"))?;

            // Guarded decrement: the balance check and the write are one
            // statement, so concurrent settlements cannot overdraw.
            let result = sqlx::query(
                r#"
                UPDATE profiles SET loyalty_points = loyalty_points - ?, updated_at = ?
                WHERE id = ? AND tenant_id = ? AND loyalty_points >= ?
                "#,
            )
            .bind(args.points_redeemed)
            .bind(now)
            .bind(customer_id)
            .bind(args.tenant_id)
            .bind(args.points_redeemed)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let row = sqlx::query(
                    "SELECT loyalty_points FROM profiles WHERE id = ? AND tenant_id = ?",
                )
                .bind(customer_id)
                .bind(args.tenant_id)
                .fetch_optional(&mut *tx)
                .await?;
                let err: anyhow::Error = match row {
                    None => DomainError::not_found("Profile", customer_id).into(),
                    Some(r) => DomainError::InsufficientPoints {
                        requested: args.points_redeemed,
                        balance: r.get("loyalty_points"),
                    }
                    .into(),
                };
                return Err(err);
            }
        }

        if args.points_earned > 0 {
            if let Some(customer_id) = args.customer_id {
                sqlx::query(
                    r#"
                    UPDATE profiles SET loyalty_points = loyalty_points + ?, updated_at = ?
                    WHERE id = ? AND tenant_id = ?
                    "#,
                )
                .bind(args.points_earned)
                .bind(now)
                .bind(customer_id)
                .bind(args.tenant_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO sale_transactions (tenant_id, booking_id, staff_id, service_id, amount_cents, payment_method, points_earned, points_redeemed, customer_id, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(args.tenant_id)
        .bind(booking_id)
        .bind(args.staff_id)
        .bind(args.service_id)
        .bind(args.amount_cents)
        .bind(args.payment_method)
        .bind(args.points_earned)
        .bind(args.points_redeemed)
        .bind(args.customer_id)
        .bind(sale_status::COMPLETED)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let sale_id = result.last_insert_rowid();
        let row = sqlx::query("SELECT * FROM sale_transactions WHERE id = ?")
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;
        let sale = map_sale_row(&row);

        tx.commit().await?;
        Ok(sale)
    }

    pub async fn list(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Vec<SaleTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM sale_transactions WHERE tenant_id = ? ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_sale_row).collect())
    }

    pub async fn get(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        id: i64,
    ) -> Result<Option<SaleTransaction>> {
        let row = sqlx::query("SELECT * FROM sale_transactions WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_sale_row))
    }

    /// Reversal marker. The row itself is immutable ledger history and is
    /// never deleted.
    pub async fn void(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<SaleTransaction> {
        let result = sqlx::query(
            "UPDATE sale_transactions SET status = ? WHERE id = ? AND tenant_id = ? AND status = ?",
        )
        .bind(sale_status::VOIDED)
        .bind(id)
        .bind(tenant_id)
        .bind(sale_status::COMPLETED)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return match Self::get(pool, tenant_id, id).await? {
                None => Err(DomainError::not_found("Transaction", id).into()),
                Some(_) => Err(DomainError::validation("sale is already voided").into()),
            };
        }

        Self::get(pool, tenant_id, id)
            .await?
            .context("Transaction not found after void")
    }

    pub async fn revenue_summary(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        days: i64,
    ) -> Result<Vec<DailyRevenue>> {
        let rows = sqlx::query(
            r#"
            SELECT date(created_at) AS day,
                   COUNT(*) AS sales,
                   COALESCE(SUM(amount_cents), 0) AS revenue_cents,
                   COALESCE(SUM(points_redeemed), 0) AS points_redeemed
            FROM sale_transactions
            WHERE tenant_id = ? AND status = ? AND created_at >= datetime('now', '-' || ? || ' days')
            GROUP BY date(created_at)
            ORDER BY day DESC
            "#,
        )
        .bind(tenant_id)
        .bind(sale_status::COMPLETED)
        .bind(days)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| DailyRevenue {
                day: r.get("day"),
                sales: r.get("sales"),
                revenue_cents: r.get("revenue_cents"),
                points_redeemed: r.get("points_redeemed"),
            })
            .collect())
    }
}
