use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::models::*;

fn map_expense_row(row: &SqliteRow) -> Expense {
    Expense {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        recorded_by: row.get("recorded_by"),
        description: row.get("description"),
        amount_cents: row.get("amount_cents"),
        created_at: row.get("created_at"),
    }
}

pub struct ExpenseRepo;

impl ExpenseRepo {
    pub async fn list(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Vec<Expense>> {
        let rows =
            sqlx::query("SELECT * FROM expenses WHERE tenant_id = ? ORDER BY created_at DESC")
                .bind(tenant_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.iter().map(map_expense_row).collect())
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        tenant_id: i64,
        recorded_by: i64,
        req: &CreateExpenseRequest,
    ) -> Result<Expense> {
        let result = sqlx::query(
            r#"
            INSERT INTO expenses (tenant_id, recorded_by, description, amount_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(recorded_by)
        .bind(&req.description)
        .bind(req.amount_cents)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        let row = sqlx::query("SELECT * FROM expenses WHERE id = ?")
            .bind(new_id)
            .fetch_optional(pool)
            .await?;
        row.as_ref()
            .map(map_expense_row)
            .context("Expense not found after creation")
    }
}
