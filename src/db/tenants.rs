use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use super::row_helpers::none_if_empty;
use super::DomainError;
use crate::models::*;

fn map_tenant_row(row: &SqliteRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        logo_url: none_if_empty(row.get("logo_url")),
        subscription_status: row.get("subscription_status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub struct TenantRepo;

impl TenantRepo {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<Tenant>> {
        let rows = sqlx::query("SELECT * FROM tenants ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_tenant_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_tenant_row))
    }

    pub async fn get_by_slug(pool: &Pool<Sqlite>, slug: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_tenant_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, req: &CreateTenantRequest) -> Result<Tenant> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (slug, name, logo_url, subscription_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.slug)
        .bind(&req.name)
        .bind(&req.logo_url)
        .bind(&req.subscription_status)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, new_id)
            .await?
            .context("Tenant not found after creation")
    }

    pub async fn update(pool: &Pool<Sqlite>, id: i64, req: &CreateTenantRequest) -> Result<Tenant> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE tenants SET slug = ?, name = ?, logo_url = ?, subscription_status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.slug)
        .bind(&req.name)
        .bind(&req.logo_url)
        .bind(&req.subscription_status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Tenant", id).into());
        }

        Self::get(pool, id)
            .await?
            .context("Tenant not found after update")
    }
}
