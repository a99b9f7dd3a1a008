use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::handlers::ErrorResponse;
use crate::models::Tenant;
use crate::AppState;

/// Leading labels that never name a tenant.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "app"];

/// Map a Host header value to a tenant slug. Pure and deterministic:
/// strip the port, lowercase, strip the `.localhost` dev suffix, then a
/// subdomain of a base domain (≥3 labels) whose leading label is not
/// reserved names the tenant. Everything else is platform context.
pub fn resolve_tenant_slug(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    let host = host.split(':').next()?.trim_end_matches('.');
    if host.is_empty() || host.starts_with('[') {
        return None;
    }

    // Bare IPv4 addresses are never tenant hosts.
    if host.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let labels: Vec<&str> = match host.strip_suffix(".localhost") {
        // Dev hosts: "<slug>.localhost"
        Some(rest) => rest.split('.').collect(),
        None => {
            let labels: Vec<&str> = host.split('.').collect();
            if labels.len() < 3 {
                return None;
            }
            labels
        }
    };

    match labels.first() {
        Some(first) if !first.is_empty() && !RESERVED_SUBDOMAINS.contains(first) => {
            Some(first.to_string())
        }
        _ => None,
    }
}

/// Extractor that resolves the request's Host header to a tenant row.
/// Foreign or unknown hosts see the same 404 as absent tenants.
pub struct TenantContext {
    pub tenant: Tenant,
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for TenantContext {
    type Rejection = TenantError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .ok_or(TenantError::NoTenant)?;

        let slug = resolve_tenant_slug(host).ok_or(TenantError::NoTenant)?;

        let tenant = state
            .store
            .get_tenant_by_slug(&slug)
            .await
            .map_err(|_| TenantError::Internal)?
            .ok_or(TenantError::NoTenant)?;

        Ok(TenantContext { tenant })
    }
}

pub enum TenantError {
    NoTenant,
    Internal,
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TenantError::NoTenant => (StatusCode::NOT_FOUND, "Tenant not found"),
            TenantError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "tenant lookup failed"),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_resolves() {
        assert_eq!(
            resolve_tenant_slug("fadecraft.chairside.app"),
            Some("fadecraft".to_string())
        );
        assert_eq!(
            resolve_tenant_slug("Fadecraft.Chairside.APP:8080"),
            Some("fadecraft".to_string())
        );
    }

    #[test]
    fn test_reserved_labels_are_platform_context() {
        for host in [
            "www.chairside.app",
            "api.chairside.app",
            "admin.chairside.app",
            "app.chairside.app",
        ] {
            assert_eq!(resolve_tenant_slug(host), None, "{}", host);
        }
    }

    #[test]
    fn test_bare_domains_have_no_tenant() {
        assert_eq!(resolve_tenant_slug("chairside.app"), None);
        assert_eq!(resolve_tenant_slug("localhost"), None);
        assert_eq!(resolve_tenant_slug("localhost:3000"), None);
        assert_eq!(resolve_tenant_slug(""), None);
    }

    #[test]
    fn test_localhost_dev_suffix() {
        assert_eq!(
            resolve_tenant_slug("fadecraft.localhost:3000"),
            Some("fadecraft".to_string())
        );
        assert_eq!(resolve_tenant_slug("www.localhost"), None);
    }

    #[test]
    fn test_ip_hosts_are_not_tenants() {
        assert_eq!(resolve_tenant_slug("192.168.1.50"), None);
        assert_eq!(resolve_tenant_slug("10.0.0.1:8080"), None);
    }
}
