use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::*;

fn map_settings_row(row: &SqliteRow) -> TenantSettings {
    TenantSettings {
        tenant_id: row.get("tenant_id"),
        kiosk_mode: row.get("kiosk_mode"),
        cancellation_buffer_minutes: row.get("cancellation_buffer_minutes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Per-tenant operational settings. The kiosk flag is authorization state
/// and is read from here on every policy decision — no process cache.
pub struct TenantSettingsRepo;

impl TenantSettingsRepo {
    pub async fn get(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<TenantSettings> {
        let row = sqlx::query("SELECT * FROM tenant_settings WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(r) => Ok(map_settings_row(&r)),
            None => {
                Self::insert_defaults(pool, tenant_id).await?;
                let r = sqlx::query("SELECT * FROM tenant_settings WHERE tenant_id = ?")
                    .bind(tenant_id)
                    .fetch_optional(pool)
                    .await?;
                r.as_ref()
                    .map(map_settings_row)
                    .context("Tenant settings missing after insert")
            }
        }
    }

    pub async fn update(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        req: &UpdateTenantSettingsRequest,
    ) -> Result<TenantSettings> {
        let current = Self::get(pool, tenant_id).await?;
        let kiosk = req.kiosk_mode.unwrap_or(current.kiosk_mode);
        let buffer = req
            .cancellation_buffer_minutes
            .unwrap_or(current.cancellation_buffer_minutes);

        sqlx::query(
            r#"
            UPDATE tenant_settings
            SET kiosk_mode = ?, cancellation_buffer_minutes = ?, updated_at = ?
            WHERE tenant_id = ?
            "#,
        )
        .bind(kiosk)
        .bind(buffer)
        .bind(Utc::now())
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Self::get(pool, tenant_id).await
    }

    async fn insert_defaults(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO tenant_settings (tenant_id, kiosk_mode, cancellation_buffer_minutes, created_at, updated_at)
            VALUES (?, 0, 120, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }
}
