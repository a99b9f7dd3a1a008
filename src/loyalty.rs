//! Loyalty ledger: pure tier/accrual/redemption arithmetic. All money is
//! integer cents; multipliers are tenths so accrual stays exact.

use crate::db::DomainError;

/// Redemption is only offered once the balance reaches this many points.
pub const MIN_REDEEM_BALANCE: i64 = 100;

/// Fixed conversion: 100 points = $10, i.e. one point is worth 10 cents.
pub const CENTS_PER_POINT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn of(points: i64) -> Self {
        match points {
            p if p >= 1000 => Tier::Gold,
            p if p >= 500 => Tier::Silver,
            _ => Tier::Bronze,
        }
    }

    /// Accrual multiplier in tenths: bronze 1.0x, silver 1.5x, gold 2.0x.
    pub fn multiplier_tenths(self) -> i64 {
        match self {
            Tier::Bronze => 10,
            Tier::Silver => 15,
            Tier::Gold => 20,
        }
    }
}

/// Cash value of a point balance.
pub fn discount_cents(points: i64) -> i64 {
    points * CENTS_PER_POINT
}

/// The most a customer may redeem against a ticket: bounded by the balance
/// and by the points needed to zero the ticket out.
pub fn max_redeemable(balance: i64, total_cents: i64) -> i64 {
    balance.min(total_cents / CENTS_PER_POINT)
}

/// Points earned on the cash portion of a sale. floor(dollars * rate),
/// computed as integer cents so no float rounding leaks into the ledger.
pub fn points_earned(net_cents: i64, tier: Tier) -> i64 {
    net_cents * tier.multiplier_tenths() / 1000
}

/// Validate a redemption request against the balance and ticket total.
/// Returns the discount in cents. A balance below the threshold is an
/// explicit refusal, never a silent clamp to zero.
pub fn validate_redemption(
    balance: i64,
    requested: i64,
    total_cents: i64,
) -> Result<i64, DomainError> {
    if requested <= 0 {
        return Ok(0);
    }
    if balance < MIN_REDEEM_BALANCE {
        return Err(DomainError::RedemptionBelowThreshold { balance });
    }
    if requested > balance {
        return Err(DomainError::InsufficientPoints {
            requested,
            balance,
        });
    }
    let discount = discount_cents(requested);
    if discount > total_cents {
        return Err(DomainError::validation(
            "redeemed points exceed the ticket amount",
        ));
    }
    Ok(discount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bounds() {
        assert_eq!(Tier::of(0), Tier::Bronze);
        assert_eq!(Tier::of(499), Tier::Bronze);
        assert_eq!(Tier::of(500), Tier::Silver);
        assert_eq!(Tier::of(999), Tier::Silver);
        assert_eq!(Tier::of(1000), Tier::Gold);
        assert_eq!(Tier::of(250_000), Tier::Gold);
    }

    #[test]
    fn test_max_redeemable_never_exceeds_balance_or_ticket() {
        for balance in [0, 1, 99, 100, 250, 600, 1000, 99_999] {
            for total in [0, 50, 1_000, 18_000, 20_000, 1_000_000] {
                let r = max_redeemable(balance, total);
                assert!(r <= balance, "redeemable {} > balance {}", r, balance);
                assert!(
                    discount_cents(r) <= total,
                    "discount {} > ticket {}",
                    discount_cents(r),
                    total
                );
            }
        }
    }

    #[test]
    fn test_silver_scenario() {
        // $200 service, 600-point silver customer redeems 200 points.
        let balance = 600;
        let total = 20_000;
        let discount = validate_redemption(balance, 200, total).unwrap();
        assert_eq!(discount, 2_000);

        let net = total - discount;
        assert_eq!(net, 18_000);
        let earned = points_earned(net, Tier::of(balance));
        assert_eq!(earned, 270);
        assert_eq!(balance - 200 + earned, 670);
    }

    #[test]
    fn test_redemption_below_threshold_is_refused() {
        let err = validate_redemption(50, 50, 10_000).unwrap_err();
        assert!(matches!(
            err,
            DomainError::RedemptionBelowThreshold { balance: 50 }
        ));
        // The sale itself may still proceed without redemption.
        assert_eq!(validate_redemption(50, 0, 10_000).unwrap(), 0);
    }

    #[test]
    fn test_redemption_cannot_overshoot_ticket() {
        // 300 points would be a $30 discount on a $25 ticket.
        let err = validate_redemption(600, 300, 2_500).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed { .. }));
        // 250 points exactly zeroes it out.
        assert_eq!(validate_redemption(600, 250, 2_500).unwrap(), 2_500);
    }

    #[test]
    fn test_accrual_floors() {
        // $180.99 at bronze earns exactly 180 points.
        assert_eq!(points_earned(18_099, Tier::Bronze), 180);
        // $0.99 earns nothing at any tier.
        assert_eq!(points_earned(99, Tier::Gold), 1); // floor(0.99 * 2.0) = 1
        assert_eq!(points_earned(49, Tier::Bronze), 0);
    }
}
