use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical booking status values
pub mod booking_status {
    pub const CONFIRMED: &str = "confirmed";
    pub const SEATED: &str = "seated";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
    pub const NO_SHOW: &str = "no_show";

    pub const ALL: &[&str] = &[CONFIRMED, SEATED, COMPLETED, CANCELLED, NO_SHOW];

    /// Terminal states: no transition leaves them except the explicit
    /// no_show forgiveness edge.
    pub fn is_terminal(status: &str) -> bool {
        matches!(status, COMPLETED | CANCELLED | NO_SHOW)
    }

    /// The full transition table. completed is reachable only through
    /// settlement; no_show -> confirmed is the forgiveness edge.
    pub fn can_transition(from: &str, to: &str) -> bool {
        matches!(
            (from, to),
            (CONFIRMED, SEATED)
                | (CONFIRMED, COMPLETED)
                | (SEATED, COMPLETED)
                | (CONFIRMED, CANCELLED)
                | (CONFIRMED, NO_SHOW)
                | (NO_SHOW, CONFIRMED)
        )
    }
}

/// Booking is the reservable unit of service time. Rows are never deleted:
/// cancellation and no-show are statuses, preserving reporting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub tenant_id: i64,
    pub service_id: i64,
    pub staff_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: i64,
    pub staff_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Walk-in seating: the booking starts life `seated` at the terminal.
#[derive(Debug, Clone, Deserialize)]
pub struct SeatWalkInRequest {
    pub service_id: i64,
    pub staff_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkNoShowRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::booking_status::*;

    #[test]
    fn test_allowed_edges() {
        assert!(can_transition(CONFIRMED, SEATED));
        assert!(can_transition(CONFIRMED, COMPLETED));
        assert!(can_transition(SEATED, COMPLETED));
        assert!(can_transition(CONFIRMED, CANCELLED));
        assert!(can_transition(CONFIRMED, NO_SHOW));
        assert!(can_transition(NO_SHOW, CONFIRMED));
    }

    #[test]
    fn test_terminal_states_have_no_exit_but_forgiveness() {
        for from in [COMPLETED, CANCELLED] {
            for to in ALL {
                assert!(!can_transition(from, to), "{} -> {} must be rejected", from, to);
            }
        }
        // no_show only goes back to confirmed
        for to in ALL {
            assert_eq!(can_transition(NO_SHOW, to), *to == CONFIRMED);
        }
    }

    #[test]
    fn test_exhaustive_edge_set() {
        // Every status pair outside the documented table is rejected.
        let allowed = [
            (CONFIRMED, SEATED),
            (CONFIRMED, COMPLETED),
            (SEATED, COMPLETED),
            (CONFIRMED, CANCELLED),
            (CONFIRMED, NO_SHOW),
            (NO_SHOW, CONFIRMED),
        ];
        for from in ALL {
            for to in ALL {
                let expected = allowed.iter().any(|(f, t)| f == from && t == to);
                assert_eq!(can_transition(from, to), expected, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_is_terminal() {
        assert!(is_terminal(COMPLETED));
        assert!(is_terminal(CANCELLED));
        assert!(is_terminal(NO_SHOW));
        assert!(!is_terminal(CONFIRMED));
        assert!(!is_terminal(SEATED));
    }
}
