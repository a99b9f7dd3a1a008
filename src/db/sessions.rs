use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::AuthSession;

fn map_session_row(row: &SqliteRow) -> AuthSession {
    AuthSession {
        id: row.get("id"),
        profile_id: row.get("profile_id"),
        token_sha256: row.get("token_sha256"),
        used: row.get("used"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

/// Refresh-token records. Tokens are stored as SHA-256 digests only;
/// `used` marks a rotated token so replay is detectable.
pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(
        pool: &Pool<Sqlite>,
        profile_id: i64,
        token_sha256: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (profile_id, token_sha256, used, expires_at, created_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(profile_id)
        .bind(token_sha256)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_digest(
        pool: &Pool<Sqlite>,
        token_sha256: &str,
    ) -> Result<Option<AuthSession>> {
        let row = sqlx::query("SELECT * FROM auth_sessions WHERE token_sha256 = ?")
            .bind(token_sha256)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_session_row))
    }

    pub async fn mark_used(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
        sqlx::query("UPDATE auth_sessions SET used = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Revoke every session for a profile — the response to a detected
    /// replay.
    pub async fn revoke_all(pool: &Pool<Sqlite>, profile_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE profile_id = ?")
            .bind(profile_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
