use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use super::DomainError;
use crate::models::*;

fn map_service_row(row: &SqliteRow) -> Service {
    Service {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        price_cents: row.get("price_cents"),
        duration_minutes: row.get("duration_minutes"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub struct ServiceRepo;

impl ServiceRepo {
    pub async fn list(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Vec<Service>> {
        let rows = sqlx::query("SELECT * FROM services WHERE tenant_id = ? ORDER BY name")
            .bind(tenant_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_service_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, tenant_id: i64, id: i64) -> Result<Option<Service>> {
        let row = sqlx::query("SELECT * FROM services WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_service_row))
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        req: &CreateServiceRequest,
    ) -> Result<Service> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO services (tenant_id, name, price_cents, duration_minutes, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(&req.name)
        .bind(req.price_cents)
        .bind(req.duration_minutes)
        .bind(req.active)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, tenant_id, new_id)
            .await?
            .context("Service not found after creation")
    }

    /// Price/duration edits affect future bookings only; settled sales
    /// carry the amount they charged.
    pub async fn update(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        id: i64,
        req: &CreateServiceRequest,
    ) -> Result<Service> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE services SET name = ?, price_cents = ?, duration_minutes = ?, active = ?, updated_at = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(&req.name)
        .bind(req.price_cents)
        .bind(req.duration_minutes)
        .bind(req.active)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Service", id).into());
        }

        Self::get(pool, tenant_id, id)
            .await?
            .context("Service not found after update")
    }
}
