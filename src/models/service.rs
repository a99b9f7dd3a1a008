use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service is a bookable catalog entry. Price and duration edits affect
/// future bookings only; settled transactions keep the amount they charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
