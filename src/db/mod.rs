mod audit;
mod bookings;
mod catalog;
mod expenses;
mod profiles;
pub(crate) mod row_helpers;
pub mod seeds;
mod sessions;
mod settings;
mod tenants;
mod transactions;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::*;

pub use transactions::SettleArgs;

/// Typed domain errors — enables reliable downcast in the API error
/// handler instead of fragile string matching. NotFound deliberately covers
/// both absent and foreign-tenant rows so probing cannot tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    NotFound { resource: String, id: String },
    InvalidTransition { from: String, to: String },
    AlreadySettled { booking_id: i64 },
    CancellationWindowExpired { buffer_minutes: i64 },
    RedemptionBelowThreshold { balance: i64 },
    InsufficientPoints { requested: i64, balance: i64 },
    PolicyDenied { redirect: String },
    SessionCorrupted { reason: String },
    ValidationFailed { message: String },
}

impl DomainError {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { resource, id } => write!(f, "{} not found: {}", resource, id),
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid booking transition: {} -> {}", from, to)
            }
            Self::AlreadySettled { booking_id } => {
                write!(f, "booking {} is already settled", booking_id)
            }
            Self::CancellationWindowExpired { buffer_minutes } => write!(
                f,
                "cancellation window expired: bookings must be cancelled at least {} minutes before start",
                buffer_minutes
            ),
            Self::RedemptionBelowThreshold { balance } => write!(
                f,
                "redemption requires a balance of at least 100 points (current: {})",
                balance
            ),
            Self::InsufficientPoints { requested, balance } => write!(
                f,
                "cannot redeem {} points with a balance of {}",
                requested, balance
            ),
            Self::PolicyDenied { redirect } => {
                write!(f, "operation not permitted (redirect: {})", redirect)
            }
            Self::SessionCorrupted { reason } => write!(f, "session corrupted: {}", reason),
            Self::ValidationFailed { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for DomainError {}

/// Store handles all database operations, delegating to per-entity repo
/// modules. Cross-entity atomicity (settlement) lives in the transactions
/// repo, which owns the sqlx transaction boundary.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_pool_size(db_path, 5).await
    }

    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps the database
    /// alive for the pool's lifetime.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;

        self.seed_platform_admin().await?;
        Ok(())
    }

    /// Seed the platform super-admin on first boot.
    async fn seed_platform_admin(&self) -> Result<()> {
        let count: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE role = 'super_admin'")
                .fetch_one(&self.pool)
                .await?;

        if count.0 == 0 {
            let password_hash = bcrypt::hash("admin", bcrypt::DEFAULT_COST)
                .map_err(|e| anyhow::anyhow!("Failed to hash default password: {}", e))?;
            seeds::seed_super_admin(&self.pool, &password_hash).await?;
            tracing::info!("Created platform admin (email: admin@chairside.local, password: admin)");
        }
        Ok(())
    }

    // ========== Tenant Operations ==========

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        tenants::TenantRepo::list(&self.pool).await
    }

    pub async fn get_tenant(&self, id: i64) -> Result<Option<Tenant>> {
        tenants::TenantRepo::get(&self.pool, id).await
    }

    pub async fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        tenants::TenantRepo::get_by_slug(&self.pool, slug).await
    }

    pub async fn create_tenant(&self, req: &CreateTenantRequest) -> Result<Tenant> {
        tenants::TenantRepo::create(&self.pool, req).await
    }

    pub async fn update_tenant(&self, id: i64, req: &CreateTenantRequest) -> Result<Tenant> {
        tenants::TenantRepo::update(&self.pool, id, req).await
    }

    // ========== Profile Operations ==========

    pub async fn get_profile(&self, id: i64) -> Result<Option<Profile>> {
        profiles::ProfileRepo::get(&self.pool, id).await
    }

    pub async fn get_profile_scoped(&self, tenant_id: i64, id: i64) -> Result<Option<Profile>> {
        profiles::ProfileRepo::get_scoped(&self.pool, tenant_id, id).await
    }

    pub async fn get_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        profiles::ProfileRepo::get_by_email(&self.pool, email).await
    }

    pub async fn list_profiles(&self, tenant_id: i64) -> Result<Vec<Profile>> {
        profiles::ProfileRepo::list_by_tenant(&self.pool, tenant_id).await
    }

    pub async fn create_profile(
        &self,
        tenant_id: Option<i64>,
        req: &CreateProfileRequest,
        password_hash: &str,
    ) -> Result<Profile> {
        profiles::ProfileRepo::create(&self.pool, tenant_id, req, password_hash).await
    }

    pub async fn grant_role(
        &self,
        tenant_id: i64,
        profile_id: i64,
        req: &GrantRoleRequest,
    ) -> Result<Profile> {
        profiles::ProfileRepo::grant_role(&self.pool, tenant_id, profile_id, req).await
    }

    // ========== Service Catalog Operations ==========

    pub async fn list_services(&self, tenant_id: i64) -> Result<Vec<Service>> {
        catalog::ServiceRepo::list(&self.pool, tenant_id).await
    }

    pub async fn get_service(&self, tenant_id: i64, id: i64) -> Result<Option<Service>> {
        catalog::ServiceRepo::get(&self.pool, tenant_id, id).await
    }

    pub async fn create_service(
        &self,
        tenant_id: i64,
        req: &CreateServiceRequest,
    ) -> Result<Service> {
        catalog::ServiceRepo::create(&self.pool, tenant_id, req).await
    }

    pub async fn update_service(
        &self,
        tenant_id: i64,
        id: i64,
        req: &CreateServiceRequest,
    ) -> Result<Service> {
        catalog::ServiceRepo::update(&self.pool, tenant_id, id, req).await
    }

    // ========== Booking Lifecycle Operations ==========

    pub async fn list_bookings(&self, tenant_id: i64) -> Result<Vec<Booking>> {
        bookings::BookingRepo::list(&self.pool, tenant_id).await
    }

    pub async fn get_booking(&self, tenant_id: i64, id: i64) -> Result<Option<Booking>> {
        bookings::BookingRepo::get(&self.pool, tenant_id, id).await
    }

    pub async fn create_booking(
        &self,
        tenant_id: i64,
        req: &CreateBookingRequest,
        end_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Booking> {
        bookings::BookingRepo::create(&self.pool, tenant_id, req, end_time).await
    }

    pub async fn create_walk_in(
        &self,
        tenant_id: i64,
        req: &SeatWalkInRequest,
        end_time: chrono::DateTime<chrono::Utc>,
    ) -> Result<Booking> {
        bookings::BookingRepo::create_walk_in(&self.pool, tenant_id, req, end_time).await
    }

    pub async fn seat_booking(&self, tenant_id: i64, id: i64) -> Result<Booking> {
        bookings::BookingRepo::seat(&self.pool, tenant_id, id).await
    }

    pub async fn cancel_booking(&self, tenant_id: i64, id: i64) -> Result<Booking> {
        bookings::BookingRepo::cancel(&self.pool, tenant_id, id).await
    }

    pub async fn mark_no_show(
        &self,
        tenant_id: i64,
        id: i64,
        by: i64,
        reason: &str,
    ) -> Result<Booking> {
        bookings::BookingRepo::mark_no_show(&self.pool, tenant_id, id, by, reason).await
    }

    pub async fn forgive_no_show(&self, tenant_id: i64, id: i64) -> Result<Booking> {
        bookings::BookingRepo::forgive(&self.pool, tenant_id, id).await
    }

    // ========== Settlement Operations ==========

    /// Atomically complete (or materialize) the booking, adjust loyalty
    /// points, and record the sale. All writes commit together or not at
    /// all.
    pub async fn settle(&self, args: &SettleArgs<'_>) -> Result<SaleTransaction> {
        transactions::SaleRepo::settle(&self.pool, args).await
    }

    pub async fn list_sales(&self, tenant_id: i64) -> Result<Vec<SaleTransaction>> {
        transactions::SaleRepo::list(&self.pool, tenant_id).await
    }

    pub async fn get_sale(&self, tenant_id: i64, id: i64) -> Result<Option<SaleTransaction>> {
        transactions::SaleRepo::get(&self.pool, tenant_id, id).await
    }

    pub async fn void_sale(&self, tenant_id: i64, id: i64) -> Result<SaleTransaction> {
        transactions::SaleRepo::void(&self.pool, tenant_id, id).await
    }

    // ========== Expense Operations ==========

    pub async fn list_expenses(&self, tenant_id: i64) -> Result<Vec<Expense>> {
        expenses::ExpenseRepo::list(&self.pool, tenant_id).await
    }

    pub async fn create_expense(
        &self,
        tenant_id: i64,
        recorded_by: i64,
        req: &CreateExpenseRequest,
    ) -> Result<Expense> {
        expenses::ExpenseRepo::create(&self.pool, tenant_id, recorded_by, req).await
    }

    // ========== Audit Trail ==========

    /// Append an audit entry. Failures are logged and swallowed: the audit
    /// sink must never fail the mutation it records.
    pub async fn audit(
        &self,
        tenant_id: i64,
        actor_id: i64,
        action: &str,
        entity: &str,
        entity_id: impl std::fmt::Display,
        metadata: serde_json::Value,
    ) {
        if let Err(e) = audit::AuditRepo::append(
            &self.pool,
            tenant_id,
            actor_id,
            action,
            entity,
            &entity_id.to_string(),
            &metadata,
        )
        .await
        {
            tracing::warn!("Failed to append audit entry ({} {}): {}", action, entity, e);
        }
    }

    pub async fn list_audit_entries(&self, tenant_id: i64, limit: i32) -> Result<Vec<AuditEntry>> {
        audit::AuditRepo::list(&self.pool, tenant_id, limit).await
    }

    // ========== Auth Session Operations ==========

    pub async fn create_auth_session(
        &self,
        profile_id: i64,
        token_sha256: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        sessions::SessionRepo::create(&self.pool, profile_id, token_sha256, expires_at).await
    }

    pub async fn get_auth_session(&self, token_sha256: &str) -> Result<Option<AuthSession>> {
        sessions::SessionRepo::get_by_digest(&self.pool, token_sha256).await
    }

    pub async fn mark_auth_session_used(&self, id: i64) -> Result<()> {
        sessions::SessionRepo::mark_used(&self.pool, id).await
    }

    pub async fn revoke_auth_sessions(&self, profile_id: i64) -> Result<u64> {
        sessions::SessionRepo::revoke_all(&self.pool, profile_id).await
    }

    // ========== Tenant Settings ==========

    pub async fn get_tenant_settings(&self, tenant_id: i64) -> Result<TenantSettings> {
        settings::TenantSettingsRepo::get(&self.pool, tenant_id).await
    }

    pub async fn update_tenant_settings(
        &self,
        tenant_id: i64,
        req: &UpdateTenantSettingsRequest,
    ) -> Result<TenantSettings> {
        settings::TenantSettingsRepo::update(&self.pool, tenant_id, req).await
    }

    // ========== Reporting ==========

    pub async fn revenue_summary(&self, tenant_id: i64, days: i64) -> Result<Vec<DailyRevenue>> {
        transactions::SaleRepo::revenue_summary(&self.pool, tenant_id, days).await
    }

    /// Raw pool handle for test fixtures.
    #[cfg(test)]
    pub(crate) fn pool_for_tests(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }
}

/// One row of the owner revenue report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DailyRevenue {
    pub day: String,
    pub sales: i64,
    pub revenue_cents: i64,
    pub points_redeemed: i64,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::role;

    /// A seeded in-memory store: one tenant ("fadecraft"), an owner, a
    /// staff barber, a customer with zero points, and a 30-minute service.
    pub struct Fixture {
        pub store: Store,
        pub tenant: Tenant,
        pub owner: Profile,
        pub staff: Profile,
        pub customer: Profile,
        pub service: Service,
    }

    pub async fn fixture() -> Fixture {
        let store = Store::open_in_memory().await.expect("in-memory store");

        let tenant = store
            .create_tenant(&CreateTenantRequest {
                slug: "fadecraft".to_string(),
                name: "Fadecraft Barbers".to_string(),
                logo_url: None,
                subscription_status: "active".to_string(),
            })
            .await
            .expect("tenant");

        let owner = seed_profile(&store, tenant.id, "owner@fadecraft.test", role::OWNER).await;
        let staff = seed_profile(&store, tenant.id, "staff@fadecraft.test", role::STAFF).await;
        let customer =
            seed_profile(&store, tenant.id, "customer@fadecraft.test", role::CUSTOMER).await;

        let service = store
            .create_service(
                tenant.id,
                &CreateServiceRequest {
                    name: "Skin fade".to_string(),
                    price_cents: 20_000,
                    duration_minutes: 30,
                    active: true,
                },
            )
            .await
            .expect("service");

        Fixture {
            store,
            tenant,
            owner,
            staff,
            customer,
            service,
        }
    }

    pub async fn seed_profile(store: &Store, tenant_id: i64, email: &str, r: &str) -> Profile {
        let profile = store
            .create_profile(
                Some(tenant_id),
                &CreateProfileRequest {
                    email: email.to_string(),
                    display_name: email.split('@').next().unwrap_or(email).to_string(),
                    password: String::new(),
                    role: r.to_string(),
                    is_active_barber: r == role::STAFF,
                },
                "$2b$04$test-hash",
            )
            .await
            .expect("profile");
        profile
    }

    /// Add loyalty points outside the settlement path, for test setup only.
    pub async fn set_points(store: &Store, profile_id: i64, points: i64) {
        sqlx::query("UPDATE profiles SET loyalty_points = ? WHERE id = ?")
            .bind(points)
            .bind(profile_id)
            .execute(&store.pool)
            .await
            .expect("set points");
    }
}
