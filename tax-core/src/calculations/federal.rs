//! Federal income tax.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Bracket tax on taxable income |
//! | 2    | Less non-refundable credits (basic personal, employment, CPP/EI), min 0 |
//! | 3    | Less federal dividend tax credit, min 0 |
//! | 4    | Plus minimum tax adjustment (always 0 for now) |
//! | 5    | Net federal tax, min 0 |

use rust_decimal::Decimal;
use tracing::debug;

use crate::dataset::{FederalRules, NamedCredit};
use crate::models::{CreditLine, FederalBreakdown, PayrollBreakdown};

use super::brackets::tax_brackets;
use super::common::{lowest_rate, non_negative};

pub const BASIC_PERSONAL_AMOUNT: &str = "basic_personal_amount";
pub const EMPLOYMENT_AMOUNT: &str = "employment_amount";
pub const CPP_EI: &str = "cpp_ei";

/// Figures the federal stage needs from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct FederalStageInput<'a> {
    pub taxable_income: Decimal,
    pub employment_income: Decimal,
    pub payroll: &'a PayrollBreakdown,
    pub dividend_tax_credit: Decimal,
}

pub fn federal_tax(
    input: FederalStageInput<'_>,
    rules: &FederalRules,
) -> FederalBreakdown {
    let brackets = tax_brackets(input.taxable_income, &rules.brackets);
    let base_tax = brackets.total_tax;

    let lowest = lowest_rate(rules.brackets.iter().map(|bracket| bracket.rate));
    let credits = federal_credits(&input, rules, lowest);
    let total_credits: Decimal = credits.iter().map(|line| line.credit).sum();
    let tax_after_credits = non_negative(base_tax - total_credits);

    let tax_after_dividend_credits = non_negative(tax_after_credits - input.dividend_tax_credit);

    let minimum_tax_adjustment = Decimal::ZERO;
    let net_tax = non_negative(tax_after_dividend_credits + minimum_tax_adjustment);

    debug!(
        taxable_income = %input.taxable_income,
        %base_tax,
        %total_credits,
        dividend_tax_credit = %input.dividend_tax_credit,
        %net_tax,
        "federal stage"
    );

    FederalBreakdown {
        brackets,
        base_tax,
        credits,
        total_credits,
        tax_after_credits,
        dividend_tax_credit: input.dividend_tax_credit,
        tax_after_dividend_credits,
        minimum_tax_adjustment,
        net_tax,
    }
}

fn federal_credits(
    input: &FederalStageInput<'_>,
    rules: &FederalRules,
    lowest: Decimal,
) -> Vec<CreditLine> {
    let mut lines = Vec::with_capacity(3);

    if let Some(credit) = &rules.credits.basic_personal_amount {
        lines.push(named_credit_line(
            BASIC_PERSONAL_AMOUNT,
            credit,
            input.taxable_income,
            lowest,
        ));
    }

    if input.employment_income > Decimal::ZERO {
        if let Some(credit) = &rules.credits.employment_amount {
            lines.push(named_credit_line(
                EMPLOYMENT_AMOUNT,
                credit,
                input.taxable_income,
                lowest,
            ));
        }
    }

    let contributions = input.payroll.cpp + input.payroll.ei;
    let rate = rules.credits.cpp_ei_rate.unwrap_or(lowest);
    lines.push(CreditLine {
        name: CPP_EI,
        amount: contributions,
        rate,
        credit: contributions * rate,
    });

    lines
}

/// Credit line for a configured credit; the explicit rate wins over the
/// schedule's lowest rate. Phase-outs are measured against `income`.
pub(crate) fn named_credit_line(
    name: &'static str,
    credit: &NamedCredit,
    income: Decimal,
    lowest: Decimal,
) -> CreditLine {
    let amount = credit.amount_at(income);
    let rate = credit.rate.unwrap_or(lowest);
    CreditLine {
        name,
        amount,
        rate,
        credit: amount * rate,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::payroll::payroll_levies;
    use crate::dataset::{TaxBracket, fixtures};

    fn no_payroll() -> PayrollBreakdown {
        payroll_levies(Decimal::ZERO, fixtures::dataset().payroll())
    }

    fn stage(
        taxable_income: Decimal,
        employment_income: Decimal,
        payroll: &PayrollBreakdown,
        dividend_tax_credit: Decimal,
    ) -> FederalBreakdown {
        federal_tax(
            FederalStageInput {
                taxable_income,
                employment_income,
                payroll,
                dividend_tax_credit,
            },
            fixtures::dataset().federal(),
        )
    }

    #[test]
    fn income_below_basic_personal_amount_owes_nothing() {
        let payroll = no_payroll();

        let result = stage(dec!(10000), Decimal::ZERO, &payroll, Decimal::ZERO);

        assert_eq!(result.base_tax, dec!(1500));
        assert_eq!(result.tax_after_credits, Decimal::ZERO);
        assert_eq!(result.net_tax, Decimal::ZERO);
    }

    #[test]
    fn employment_amount_requires_employment_income() {
        let payroll = no_payroll();

        let without = stage(dec!(50000), Decimal::ZERO, &payroll, Decimal::ZERO);
        let with = stage(dec!(50000), dec!(50000), &payroll, Decimal::ZERO);

        assert!(without.credits.iter().all(|line| line.name != EMPLOYMENT_AMOUNT));
        let employment = with
            .credits
            .iter()
            .find(|line| line.name == EMPLOYMENT_AMOUNT)
            .unwrap();
        assert_eq!(employment.credit, dec!(214.95));
    }

    #[test]
    fn cpp_ei_credit_uses_contributions() {
        let payroll = payroll_levies(dec!(50000), fixtures::dataset().payroll());

        let result = stage(dec!(50000), dec!(50000), &payroll, Decimal::ZERO);

        let line = result.credits.iter().find(|line| line.name == CPP_EI).unwrap();
        assert_eq!(line.amount, dec!(3596.75));
        assert_eq!(line.credit, dec!(539.5125));
    }

    #[test]
    fn credits_are_claimed_at_lowest_rate_even_when_unsorted() {
        let mut rules = fixtures::dataset().federal().clone();
        rules.brackets = vec![
            TaxBracket { threshold: dec!(0), rate: dec!(0.20) },
            TaxBracket { threshold: dec!(10000), rate: dec!(0.10) },
        ];
        let payroll = no_payroll();

        let result = federal_tax(
            FederalStageInput {
                taxable_income: dec!(50000),
                employment_income: Decimal::ZERO,
                payroll: &payroll,
                dividend_tax_credit: Decimal::ZERO,
            },
            &rules,
        );

        assert_eq!(result.credits[0].rate, dec!(0.10));
    }

    #[test]
    fn basic_personal_amount_phases_out() {
        let payroll = no_payroll();

        let result = stage(dec!(300000), Decimal::ZERO, &payroll, Decimal::ZERO);

        assert_eq!(result.credits[0].amount, dec!(14156));
    }

    #[test]
    fn dividend_credit_cannot_push_tax_below_zero() {
        let payroll = no_payroll();

        let result = stage(dec!(30000), Decimal::ZERO, &payroll, dec!(100000));

        assert!(result.tax_after_credits > Decimal::ZERO);
        assert_eq!(result.tax_after_dividend_credits, Decimal::ZERO);
        assert_eq!(result.net_tax, Decimal::ZERO);
    }

    #[test]
    fn known_answer_for_grossed_up_dividends() {
        let payroll = no_payroll();

        let result = stage(dec!(220800), Decimal::ZERO, &payroll, dec!(33163.7184));

        assert_eq!(result.base_tax, dec!(49617.85));
        assert!((result.net_tax - dec!(14248.7439)).abs() < dec!(0.001));
    }
}
