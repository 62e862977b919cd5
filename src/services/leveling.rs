//! Leveling policy
//!
//! Pure mapping from lifetime attributed-order counts to tiers, and from
//! tiers to flat per-item commission amounts. Thresholds double at each rank
//! from 16 upward; amounts are fixed currency units.

use rust_decimal::Decimal;

use crate::models::AffiliateTier;

/// Tier for a lifetime order count. Total and monotonic non-decreasing.
pub fn tier_for_orders(order_count: i64) -> AffiliateTier {
    if order_count >= 4096 {
        AffiliateTier::Diamond
    } else if order_count >= 1024 {
        AffiliateTier::Platinum
    } else if order_count >= 256 {
        AffiliateTier::Gold
    } else if order_count >= 64 {
        AffiliateTier::Silver
    } else if order_count >= 16 {
        AffiliateTier::Bronze
    } else {
        AffiliateTier::Newbie
    }
}

/// Flat per-item commission for a tier. An absent or unknown tier (historic
/// orders predating the current scheme) pays the lowest defined rate rather
/// than failing.
pub fn commission_for_tier(tier: Option<AffiliateTier>) -> Decimal {
    let units: i64 = match tier {
        Some(AffiliateTier::Diamond) => 86,
        Some(AffiliateTier::Platinum) => 54,
        Some(AffiliateTier::Gold) => 36,
        Some(AffiliateTier::Silver) => 24,
        Some(AffiliateTier::Bronze) | Some(AffiliateTier::Newbie) | None => 16,
    };
    Decimal::from(units)
}

/// Commission owed for one order line: snapshot tier times quantity.
pub fn line_commission(tier_at_order_time: Option<AffiliateTier>, qty: i32) -> Decimal {
    commission_for_tier(tier_at_order_time) * Decimal::from(qty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn thresholds() {
        assert_eq!(tier_for_orders(0), AffiliateTier::Newbie);
        assert_eq!(tier_for_orders(15), AffiliateTier::Newbie);
        assert_eq!(tier_for_orders(16), AffiliateTier::Bronze);
        assert_eq!(tier_for_orders(63), AffiliateTier::Bronze);
        assert_eq!(tier_for_orders(64), AffiliateTier::Silver);
        assert_eq!(tier_for_orders(255), AffiliateTier::Silver);
        assert_eq!(tier_for_orders(256), AffiliateTier::Gold);
        assert_eq!(tier_for_orders(1023), AffiliateTier::Gold);
        assert_eq!(tier_for_orders(1024), AffiliateTier::Platinum);
        assert_eq!(tier_for_orders(4095), AffiliateTier::Platinum);
        assert_eq!(tier_for_orders(4096), AffiliateTier::Diamond);
        assert_eq!(tier_for_orders(1_000_000), AffiliateTier::Diamond);
    }

    #[test]
    fn tier_is_monotonic_in_order_count() {
        let mut previous = tier_for_orders(0);
        for n in 1..5000 {
            let current = tier_for_orders(n);
            assert!(current >= previous, "tier regressed at n={}", n);
            previous = current;
        }
    }

    #[test]
    fn commission_table() {
        assert_eq!(commission_for_tier(Some(AffiliateTier::Bronze)), dec!(16));
        assert_eq!(commission_for_tier(Some(AffiliateTier::Silver)), dec!(24));
        assert_eq!(commission_for_tier(Some(AffiliateTier::Gold)), dec!(36));
        assert_eq!(commission_for_tier(Some(AffiliateTier::Platinum)), dec!(54));
        assert_eq!(commission_for_tier(Some(AffiliateTier::Diamond)), dec!(86));
    }

    #[test]
    fn unknown_tier_pays_lowest_rate() {
        assert_eq!(commission_for_tier(None), dec!(16));
        assert_eq!(commission_for_tier(Some(AffiliateTier::Newbie)), dec!(16));
    }

    #[test]
    fn higher_tier_never_pays_less() {
        let tiers = [
            AffiliateTier::Newbie,
            AffiliateTier::Bronze,
            AffiliateTier::Silver,
            AffiliateTier::Gold,
            AffiliateTier::Platinum,
            AffiliateTier::Diamond,
        ];
        for pair in tiers.windows(2) {
            assert!(commission_for_tier(Some(pair[1])) >= commission_for_tier(Some(pair[0])));
        }
    }

    #[test]
    fn line_commission_scales_with_quantity() {
        assert_eq!(line_commission(Some(AffiliateTier::Silver), 3), dec!(72));
        assert_eq!(line_commission(None, 2), dec!(32));
    }
}
