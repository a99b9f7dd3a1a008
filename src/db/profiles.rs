use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::row_helpers::map_profile_row;
use super::DomainError;
use crate::models::*;

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_profile_row))
    }

    /// Tenant-scoped lookup: a foreign tenant's profile is simply absent.
    pub async fn get_scoped(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        id: i64,
    ) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_profile_row))
    }

    pub async fn get_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_profile_row))
    }

    pub async fn list_by_tenant(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Vec<Profile>> {
        let rows = sqlx::query("SELECT * FROM profiles WHERE tenant_id = ? ORDER BY display_name")
            .bind(tenant_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_profile_row).collect())
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        tenant_id: Option<i64>,
        req: &CreateProfileRequest,
        password_hash: &str,
    ) -> Result<Profile> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (tenant_id, email, display_name, role, is_active_barber, loyalty_points, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(&req.email)
        .bind(&req.display_name)
        .bind(&req.role)
        .bind(req.is_active_barber)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, new_id)
            .await?
            .context("Profile not found after creation")
    }

    /// The only mutation path for role and barber flag. Points are
    /// untouchable here; settlement owns them.
    pub async fn grant_role(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        profile_id: i64,
        req: &GrantRoleRequest,
    ) -> Result<Profile> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE profiles SET role = ?, is_active_barber = ?, tenant_id = ?, updated_at = ?
            WHERE id = ? AND (tenant_id = ? OR tenant_id IS NULL)
            "#,
        )
        .bind(&req.role)
        .bind(req.is_active_barber)
        .bind(tenant_id)
        .bind(now)
        .bind(profile_id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Profile", profile_id).into());
        }

        Self::get(pool, profile_id)
            .await?
            .context("Profile not found after role grant")
    }
}
