//! Access policy engine. One pure decision function consumed by both the
//! server-side guards (authoritative) and the client navigation endpoint,
//! so the two can never drift apart.

use serde::{Deserialize, Serialize};

use crate::db::DomainError;
use crate::models::role;

/// The navigable/operable surfaces of a tenant, as coarse policy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteArea {
    Schedule,
    Terminal,
    Expenses,
    Dashboard,
    Customers,
    Reports,
    Settings,
    Team,
    Catalog,
    AuditLog,
    Portal,
}

impl RouteArea {
    pub const ALL: &'static [RouteArea] = &[
        RouteArea::Schedule,
        RouteArea::Terminal,
        RouteArea::Expenses,
        RouteArea::Dashboard,
        RouteArea::Customers,
        RouteArea::Reports,
        RouteArea::Settings,
        RouteArea::Team,
        RouteArea::Catalog,
        RouteArea::AuditLog,
        RouteArea::Portal,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny { redirect: &'static str },
}

/// Operational surfaces reachable while kiosk mode is active — for every
/// role, owner included.
const KIOSK_ALLOWED: &[RouteArea] = &[
    RouteArea::Schedule,
    RouteArea::Terminal,
    RouteArea::Expenses,
    RouteArea::Dashboard,
];

/// Staff see the operational surfaces plus the customer list; reports,
/// settings, team management and catalog editing stay owner-only.
const STAFF_ALLOWED: &[RouteArea] = &[
    RouteArea::Schedule,
    RouteArea::Terminal,
    RouteArea::Expenses,
    RouteArea::Dashboard,
    RouteArea::Customers,
    RouteArea::Portal,
];

/// First match wins: kiosk lockdown, then role defaults. Kiosk mode is
/// zero-trust — no role bypasses it.
pub fn decide(actor_role: &str, kiosk_active: bool, area: RouteArea) -> AccessDecision {
    if kiosk_active {
        return if KIOSK_ALLOWED.contains(&area) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny {
                redirect: "/terminal",
            }
        };
    }

    match actor_role {
        role::OWNER | role::SUPER_ADMIN => AccessDecision::Allow,
        role::STAFF => {
            if STAFF_ALLOWED.contains(&area) {
                AccessDecision::Allow
            } else {
                AccessDecision::Deny {
                    redirect: "/dashboard",
                }
            }
        }
        // A dedicated kiosk login is always confined to the kiosk surface.
        role::KIOSK => {
            if KIOSK_ALLOWED.contains(&area) {
                AccessDecision::Allow
            } else {
                AccessDecision::Deny {
                    redirect: "/terminal",
                }
            }
        }
        // Customers and unaffiliated users belong in the booking portal.
        _ => {
            if area == RouteArea::Portal {
                AccessDecision::Allow
            } else {
                AccessDecision::Deny { redirect: "/book" }
            }
        }
    }
}

/// Server-side guard for mutating operations. Navigation denials redirect;
/// mutation denials surface as a typed refusal.
pub fn require(actor_role: &str, kiosk_active: bool, area: RouteArea) -> Result<(), DomainError> {
    match decide(actor_role, kiosk_active, area) {
        AccessDecision::Allow => Ok(()),
        AccessDecision::Deny { redirect } => Err(DomainError::PolicyDenied {
            redirect: redirect.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kiosk_mode_is_role_independent() {
        // Once kiosk mode is active, every role gets the identical surface.
        for r in role::ALL {
            for area in RouteArea::ALL {
                let expected = KIOSK_ALLOWED.contains(area);
                let decision = decide(r, true, *area);
                assert_eq!(
                    decision == AccessDecision::Allow,
                    expected,
                    "role {} area {:?}",
                    r,
                    area
                );
                if let AccessDecision::Deny { redirect } = decision {
                    assert_eq!(redirect, "/terminal");
                }
            }
        }
    }

    #[test]
    fn test_owner_and_super_admin_have_full_access() {
        for r in [role::OWNER, role::SUPER_ADMIN] {
            for area in RouteArea::ALL {
                assert_eq!(decide(r, false, *area), AccessDecision::Allow);
            }
        }
    }

    #[test]
    fn test_staff_restrictions() {
        for area in [RouteArea::Schedule, RouteArea::Terminal, RouteArea::Customers] {
            assert_eq!(decide(role::STAFF, false, area), AccessDecision::Allow);
        }
        for area in [
            RouteArea::Reports,
            RouteArea::Settings,
            RouteArea::Team,
            RouteArea::Catalog,
            RouteArea::AuditLog,
        ] {
            assert!(
                matches!(decide(role::STAFF, false, area), AccessDecision::Deny { .. }),
                "staff must not reach {:?}",
                area
            );
        }
    }

    #[test]
    fn test_customer_is_redirected_to_portal() {
        assert_eq!(decide(role::CUSTOMER, false, RouteArea::Portal), AccessDecision::Allow);
        for area in [RouteArea::Terminal, RouteArea::Reports, RouteArea::Settings] {
            assert_eq!(
                decide(role::CUSTOMER, false, area),
                AccessDecision::Deny { redirect: "/book" }
            );
        }
    }

    #[test]
    fn test_require_maps_deny_to_policy_error() {
        let err = require(role::STAFF, false, RouteArea::Settings).unwrap_err();
        assert!(matches!(err, DomainError::PolicyDenied { .. }));
        assert!(require(role::OWNER, false, RouteArea::Settings).is_ok());
        // And the guard honors kiosk mode for the owner too.
        let err = require(role::OWNER, true, RouteArea::Settings).unwrap_err();
        assert!(matches!(err, DomainError::PolicyDenied { .. }));
    }
}
