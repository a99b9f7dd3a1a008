use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AuditEntry is one append-only record of a sensitive mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub tenant_id: i64,
    pub actor_id: i64,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
