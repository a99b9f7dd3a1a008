use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile represents an actor: customer, staff member, owner, kiosk
/// terminal, or platform super-admin. tenant_id is NULL for unaffiliated
/// users (fresh signups, platform admins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub is_active_barber: bool,
    pub loyalty_points: i64,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub is_active_barber: bool,
}

/// Explicit role/tenant grant — the only way role and tenant_id change.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantRoleRequest {
    pub role: String,
    #[serde(default)]
    pub is_active_barber: bool,
}

fn default_role() -> String {
    super::role::CUSTOMER.to_string()
}
