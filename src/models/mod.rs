mod audit;
mod auth;
mod booking;
mod expense;
mod profile;
mod service;
mod settings;
mod tenant;
mod transaction;

pub use audit::*;
pub use auth::*;
pub use booking::*;
pub use expense::*;
pub use profile::*;
pub use service::*;
pub use settings::*;
pub use tenant::*;
pub use transaction::*;

/// Canonical subscription status values
pub mod subscription_status {
    pub const ACTIVE: &str = "active";
    pub const SUSPENDED: &str = "suspended";
    pub const TRIAL: &str = "trial";

    pub const ALL: &[&str] = &[ACTIVE, SUSPENDED, TRIAL];
}

/// Canonical actor role values
pub mod role {
    pub const CUSTOMER: &str = "customer";
    pub const STAFF: &str = "staff";
    pub const OWNER: &str = "owner";
    pub const KIOSK: &str = "kiosk";
    pub const SUPER_ADMIN: &str = "super_admin";

    pub const ALL: &[&str] = &[CUSTOMER, STAFF, OWNER, KIOSK, SUPER_ADMIN];
}

/// Canonical payment method values
pub mod payment_method {
    pub const CASH: &str = "cash";
    pub const CARD: &str = "card";
    pub const TRANSFER: &str = "transfer";

    pub const ALL: &[&str] = &[CASH, CARD, TRANSFER];
}

/// Canonical audit action values
pub mod audit_action {
    pub const BOOKING_CREATED: &str = "booking_created";
    pub const BOOKING_SEATED: &str = "booking_seated";
    pub const BOOKING_CANCELLED: &str = "booking_cancelled";
    pub const BOOKING_NO_SHOW: &str = "booking_no_show";
    pub const BOOKING_FORGIVEN: &str = "booking_forgiven";
    pub const POS_SALE: &str = "pos_sale";
    pub const SALE_VOIDED: &str = "sale_voided";
    pub const ROLE_GRANTED: &str = "role_granted";
    pub const KIOSK_MODE_CHANGED: &str = "kiosk_mode_changed";
}
