use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// TenantSettings is per-tenant operational state. kiosk_mode is read on
/// every policy decision rather than cached, so all server instances agree.
/// The cancellation buffer is always consulted; 0 must be set explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    pub tenant_id: i64,
    pub kiosk_mode: bool,
    pub cancellation_buffer_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTenantSettingsRequest {
    #[serde(default)]
    pub kiosk_mode: Option<bool>,
    #[serde(default)]
    pub cancellation_buffer_minutes: Option<i64>,
}
