use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical sale status values
pub mod sale_status {
    pub const COMPLETED: &str = "completed";
    pub const VOIDED: &str = "voided";
}

/// SaleTransaction is the financial ledger row created exactly once per
/// settled booking. Never deleted; a reversal flips status to `voided`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleTransaction {
    pub id: i64,
    pub tenant_id: i64,
    pub booking_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub amount_cents: i64,
    pub payment_method: String,
    pub points_earned: i64,
    pub points_redeemed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Settlement request. With `booking_id` this completes a scheduled
/// booking; without it the engine materializes a walk-in ghost booking.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleRequest {
    #[serde(default)]
    pub booking_id: Option<i64>,
    pub staff_id: i64,
    pub service_id: i64,
    /// Override for the charged amount; defaults to the service price.
    #[serde(default)]
    pub amount_cents: Option<i64>,
    pub payment_method: String,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub redeem_points: Option<i64>,
}
