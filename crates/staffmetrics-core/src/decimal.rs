use rust_decimal::{Decimal, RoundingStrategy};

/// Build a one-fractional-digit decimal from a count of tenths (`42` -> `4.2`).
pub fn tenths(value: i64) -> Decimal {
    Decimal::new(value, 1)
}

/// Round to one fractional digit, halves away from zero.
pub fn round_tenths(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `value` carries no more than one fractional digit.
pub fn is_tenths(value: Decimal) -> bool {
    value.normalize().scale() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_midpoints_away_from_zero() {
        assert_eq!(round_tenths(Decimal::new(2625, 3)), tenths(26));
        assert_eq!(round_tenths(Decimal::new(255, 2)), tenths(26));
        assert_eq!(round_tenths(Decimal::new(2575, 3)), tenths(26));
    }

    #[test]
    fn detects_extra_precision() {
        assert!(is_tenths(tenths(35)));
        assert!(is_tenths(Decimal::new(3500, 3)));
        assert!(!is_tenths(Decimal::new(355, 2)));
    }
}
