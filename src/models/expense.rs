use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expense is a walk-up cash-drawer entry recorded at the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub tenant_id: i64,
    pub recorded_by: i64,
    pub description: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount_cents: i64,
}
