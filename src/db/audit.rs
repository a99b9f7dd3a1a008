use anyhow::Result;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::AuditEntry;

fn map_audit_row(row: &SqliteRow) -> AuditEntry {
    let metadata: String = row.get("metadata");
    AuditEntry {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        actor_id: row.get("actor_id"),
        action: row.get("action"),
        entity: row.get("entity"),
        entity_id: row.get("entity_id"),
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

/// Append-only audit log. There is deliberately no update or delete.
pub struct AuditRepo;

impl AuditRepo {
    pub async fn append(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        actor_id: i64,
        action: &str,
        entity: &str,
        entity_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (tenant_id, actor_id, action, entity, entity_id, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(actor_id)
        .bind(action)
        .bind(entity)
        .bind(entity_id)
        .bind(metadata.to_string())
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list(pool: &Pool<Sqlite>, tenant_id: i64, limit: i32) -> Result<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_entries WHERE tenant_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_audit_row).collect())
    }
}
