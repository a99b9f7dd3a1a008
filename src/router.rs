use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::healthcheck))
        // Auth routes
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Tenant routes
        .route("/api/tenant", get(handlers::tenants::current_tenant))
        .route("/api/tenants", get(handlers::tenants::list_tenants))
        .route("/api/tenants", post(handlers::tenants::create_tenant))
        .route("/api/tenants/:id", get(handlers::tenants::get_tenant))
        .route("/api/tenants/:id", put(handlers::tenants::update_tenant))
        // Profile routes
        .route("/api/signup", post(handlers::profiles::signup))
        .route("/api/customers", get(handlers::profiles::list_customers))
        .route("/api/team", get(handlers::profiles::list_team))
        .route("/api/team/:id/role", put(handlers::profiles::grant_role))
        // Service catalog routes
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/services", post(handlers::catalog::create_service))
        .route("/api/services/:id", put(handlers::catalog::update_service))
        // Booking lifecycle routes
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/walk-in", post(handlers::bookings::seat_walk_in))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id/seat", post(handlers::bookings::seat_booking))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel_booking))
        .route("/api/bookings/:id/no-show", post(handlers::bookings::mark_no_show))
        .route("/api/bookings/:id/forgive", post(handlers::bookings::forgive_no_show))
        // Settlement routes
        .route("/api/sales", post(handlers::sales::settle))
        .route("/api/sales", get(handlers::sales::list_sales))
        .route("/api/sales/:id", get(handlers::sales::get_sale))
        .route("/api/sales/:id/void", post(handlers::sales::void_sale))
        // Expense routes
        .route("/api/expenses", get(handlers::expenses::list_expenses))
        .route("/api/expenses", post(handlers::expenses::create_expense))
        // Loyalty routes
        .route("/api/loyalty/:customer_id", get(handlers::loyalty::redemption_preview))
        // Reporting routes
        .route("/api/reports/summary", get(handlers::reports::revenue_summary))
        // Audit trail
        .route("/api/audit", get(handlers::audit::list_audit_entries))
        // Tenant settings + kiosk mode
        .route("/api/settings", get(handlers::settings::get_settings))
        .route("/api/settings", put(handlers::settings::update_settings))
        .route("/api/settings/kiosk", put(handlers::settings::set_kiosk_mode))
        // Access policy (client navigation guard)
        .route("/api/access/decision", get(handlers::access::get_access_decision))
        // WebSocket route
        .route("/api/ws", get(crate::ws_upgrade_handler))
        // Add state and middleware
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
