//! Rounding and clamping helpers shared by every calculation stage.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to cents, with midpoints away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate to four decimal places (hundredths of a percent).
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a stage result at zero. Every intermediate tax figure passes
/// through here before the next stage sees it.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-0.01)), dec!(0));
/// assert_eq!(non_negative(dec!(12.5)), dec!(12.5));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Lowest rate in a schedule, found by scanning every entry rather than
/// assuming the first bracket is the lowest.
pub fn lowest_rate<I>(rates: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    rates.into_iter().min().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(14248.745)), dec!(14248.75));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn round_half_up_preserves_already_rounded_values() {
        assert_eq!(round_half_up(dec!(3867.50)), dec!(3867.50));
    }

    // =========================================================================
    // round_rate tests
    // =========================================================================

    #[test]
    fn round_rate_keeps_four_places() {
        assert_eq!(round_rate(dec!(0.434149)), dec!(0.4341));
        assert_eq!(round_rate(dec!(0.29655)), dec!(0.2966));
    }

    // =========================================================================
    // non_negative tests
    // =========================================================================

    #[test]
    fn non_negative_floors_at_zero() {
        assert_eq!(non_negative(dec!(-150.00)), Decimal::ZERO);
    }

    #[test]
    fn non_negative_keeps_positive_values() {
        assert_eq!(non_negative(dec!(150.00)), dec!(150.00));
    }

    // =========================================================================
    // lowest_rate tests
    // =========================================================================

    #[test]
    fn lowest_rate_scans_unsorted_rates() {
        let rates = [dec!(0.205), dec!(0.15), dec!(0.33)];

        assert_eq!(lowest_rate(rates), dec!(0.15));
    }

    #[test]
    fn lowest_rate_of_nothing_is_zero() {
        assert_eq!(lowest_rate(Vec::new()), Decimal::ZERO);
    }
}
