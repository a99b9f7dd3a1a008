use sqlx::{sqlite::SqliteRow, Row};

use crate::models::*;

/// Filter empty strings to None — used when DB stores '' instead of NULL
pub fn none_if_empty(opt: Option<String>) -> Option<String> {
    opt.filter(|s| !s.is_empty())
}

/// Map a SQLite row to a Profile struct
pub fn map_profile_row(row: &SqliteRow) -> Profile {
    Profile {
        id: row.get("id"),
        tenant_id: row.try_get::<Option<i64>, _>("tenant_id").ok().flatten(),
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: row.get("role"),
        is_active_barber: row.get("is_active_barber"),
        loyalty_points: row.get("loyalty_points"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a Booking struct
pub fn map_booking_row(row: &SqliteRow) -> Booking {
    Booking {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        service_id: row.get("service_id"),
        staff_id: row.get("staff_id"),
        customer_id: row.try_get::<Option<i64>, _>("customer_id").ok().flatten(),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        status: row.get("status"),
        notes: none_if_empty(row.get("notes")),
        no_show_by: row.try_get::<Option<i64>, _>("no_show_by").ok().flatten(),
        no_show_reason: none_if_empty(row.get("no_show_reason")),
        no_show_at: row.try_get("no_show_at").ok().flatten(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a SaleTransaction struct
pub fn map_sale_row(row: &SqliteRow) -> SaleTransaction {
    SaleTransaction {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        booking_id: row.get("booking_id"),
        staff_id: row.get("staff_id"),
        service_id: row.get("service_id"),
        amount_cents: row.get("amount_cents"),
        payment_method: row.get("payment_method"),
        points_earned: row.get("points_earned"),
        points_redeemed: row.get("points_redeemed"),
        customer_id: row.try_get::<Option<i64>, _>("customer_id").ok().flatten(),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}
