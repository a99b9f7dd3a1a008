use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::role;

/// Insert the platform super-admin if absent. Runs on every boot; the
/// email is the conflict key.
pub async fn seed_super_admin(pool: &Pool<Sqlite>, password_hash: &str) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO profiles (tenant_id, email, display_name, role, is_active_barber, loyalty_points, password_hash, created_at, updated_at)
        SELECT NULL, 'admin@chairside.local', 'Platform Admin', ?, 0, 0, ?, ?, ?
        WHERE NOT EXISTS (SELECT 1 FROM profiles WHERE email = 'admin@chairside.local')
        "#,
    )
    .bind(role::SUPER_ADMIN)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
