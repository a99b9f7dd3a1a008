use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant is the root aggregate: an isolated shop account that owns all
/// other entities by tenant_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub subscription_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenantRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_subscription_status")]
    pub subscription_status: String,
}

fn default_subscription_status() -> String {
    super::subscription_status::TRIAL.to_string()
}
