//! Marginal rates by finite difference.
//!
//! Each rate re-runs the whole pipeline with one currency unit added to a
//! single income component, so phase-outs, payroll credit changes, dividend
//! credits and premium bands all show up in the result. The combined rate is
//! the one for the first non-zero component in
//! [`IncomeKind::PRIORITY`](crate::IncomeKind::PRIORITY) order.

use rust_decimal::Decimal;

use crate::dataset::TaxYearDataset;
use crate::error::TaxError;
use crate::models::{IncomeKind, MarginalRates, PersonalTaxInput};

use super::engine::{check_input_range, run_pipeline};

/// Amount added to the perturbed income component.
pub const PERTURBATION: Decimal = Decimal::ONE;

/// Marginal income tax rate for every income kind.
///
/// # Errors
///
/// [`TaxError::AmountOutOfRange`] for an input amount beyond
/// [`MAX_INPUT_AMOUNT`](super::engine::MAX_INPUT_AMOUNT), or any error the
/// pipeline itself raises for `input`.
pub fn marginal_rates(
    input: &PersonalTaxInput,
    dataset: &TaxYearDataset,
) -> Result<MarginalRates, TaxError> {
    check_input_range(input)?;
    let base = run_pipeline(input, dataset)?.income_tax();
    marginal_rates_from(input, dataset, base)
}

/// Same as [`marginal_rates`] with the unperturbed income tax already known.
pub(crate) fn marginal_rates_from(
    input: &PersonalTaxInput,
    dataset: &TaxYearDataset,
    base_income_tax: Decimal,
) -> Result<MarginalRates, TaxError> {
    let rate_for = |kind: IncomeKind| -> Result<Decimal, TaxError> {
        let perturbed = input.with_added_income(kind, PERTURBATION);
        let income_tax = run_pipeline(&perturbed, dataset)?.income_tax();
        Ok((income_tax - base_income_tax) / PERTURBATION)
    };

    let employment = rate_for(IncomeKind::Employment)?;
    let eligible_dividends = rate_for(IncomeKind::EligibleDividends)?;
    let non_eligible_dividends = rate_for(IncomeKind::NonEligibleDividends)?;
    let capital_gains = rate_for(IncomeKind::CapitalGains)?;

    let combined_source = input.primary_income_kind();
    let mut rates = MarginalRates {
        employment,
        eligible_dividends,
        non_eligible_dividends,
        capital_gains,
        combined: Decimal::ZERO,
        combined_source,
    };
    rates.combined = rates.for_kind(combined_source);

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::common::round_rate;
    use crate::calculations::engine::calculate;
    use crate::dataset::fixtures;

    fn ontario(employment_income: Decimal) -> PersonalTaxInput {
        PersonalTaxInput {
            year: fixtures::YEAR,
            province: "ON".to_string(),
            employment_income,
            ..Default::default()
        }
    }

    #[test]
    fn employment_rate_is_sum_of_bracket_rates_when_nothing_else_moves() {
        let dataset = fixtures::dataset();

        let rates = marginal_rates(&ontario(dec!(75000)), &dataset).unwrap();

        // 20.5% federal + 9.15% Ontario; CPP, EI and health premium are capped
        assert_eq!(rates.employment, dec!(0.2965));
        assert_eq!(rates.combined, rates.employment);
        assert_eq!(rates.combined_source, IncomeKind::Employment);
    }

    #[test]
    fn capital_gains_rate_reflects_inclusion_rate() {
        let dataset = fixtures::dataset();

        let rates = marginal_rates(&ontario(dec!(75000)), &dataset).unwrap();

        assert_eq!(rates.capital_gains, dec!(0.14825));
    }

    #[test]
    fn eligible_dividend_rate_nets_gross_up_against_credits() {
        let dataset = fixtures::dataset();

        let rates = marginal_rates(&ontario(dec!(75000)), &dataset).unwrap();

        // 1.38 × (20.5% − 15.0198%) + 1.38 × (9.15% − 10%)
        assert_eq!(rates.eligible_dividends, dec!(0.06389676));
    }

    #[test]
    fn combined_rate_follows_priority_order() {
        let dataset = fixtures::dataset();
        let input = PersonalTaxInput {
            employment_income: Decimal::ZERO,
            capital_gains: dec!(40000),
            non_eligible_dividends: dec!(20000),
            ..ontario(Decimal::ZERO)
        };

        let rates = marginal_rates(&input, &dataset).unwrap();

        assert_eq!(rates.combined_source, IncomeKind::NonEligibleDividends);
        assert_eq!(rates.combined, rates.non_eligible_dividends);
    }

    #[test]
    fn no_income_perturbs_employment() {
        let dataset = fixtures::dataset();

        let rates = marginal_rates(&ontario(Decimal::ZERO), &dataset).unwrap();

        assert_eq!(rates.combined_source, IncomeKind::Employment);
    }

    #[test]
    fn basic_personal_amount_phase_out_raises_the_rate() {
        let dataset = fixtures::dataset();

        let below = marginal_rates(&ontario(dec!(170000)), &dataset).unwrap();
        let inside = marginal_rates(&ontario(dec!(200000)), &dataset).unwrap();

        assert!(inside.employment > below.employment);
    }

    #[test]
    fn health_premium_band_shows_in_the_rate() {
        let dataset = fixtures::dataset();

        // 25% premium slope between 48,000 and 48,600
        let inside_band = marginal_rates(&ontario(dec!(48200)), &dataset).unwrap();
        let plateau = marginal_rates(&ontario(dec!(49000)), &dataset).unwrap();

        assert!(inside_band.employment - plateau.employment > dec!(0.2));
    }

    #[test]
    fn marginal_rate_matches_next_unit_of_income() {
        let dataset = fixtures::dataset();

        for income in [dec!(30000), dec!(75000), dec!(160000), dec!(210000), dec!(400000)] {
            let here = calculate(&ontario(income), &dataset).unwrap();
            let next = calculate(&ontario(income + PERTURBATION), &dataset).unwrap();

            let difference = next.totals.income_tax - here.totals.income_tax;
            assert!(
                (difference - here.totals.marginal_rate * PERTURBATION).abs() <= dec!(0.05),
                "income {income}: difference {difference}, marginal {}",
                here.totals.marginal_rate
            );
        }
    }

    #[test]
    fn dividend_rate_matches_next_unit_of_dividends() {
        let dataset = fixtures::dataset();
        let input = PersonalTaxInput {
            eligible_dividends: dec!(160000),
            ..ontario(Decimal::ZERO)
        };
        let bumped = input.with_added_income(IncomeKind::EligibleDividends, PERTURBATION);

        let here = calculate(&input, &dataset).unwrap();
        let next = calculate(&bumped, &dataset).unwrap();

        let difference = next.totals.income_tax - here.totals.income_tax;
        assert_eq!(here.totals.marginal_rate, round_rate(here.breakdown.marginal.eligible_dividends));
        assert!((difference - here.totals.marginal_rate).abs() <= dec!(0.05));
    }
}
