use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One person's figures for a single tax year.
///
/// Every amount defaults to zero when absent. Negative values are passed
/// through unchanged; rejecting them is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalTaxInput {
    pub year: i32,
    /// Any spelling accepted by [`crate::Jurisdiction::normalize`].
    pub province: String,

    pub employment_income: Decimal,
    pub self_employment_income: Decimal,
    pub other_income: Decimal,
    /// Cash amount received, before gross-up.
    pub eligible_dividends: Decimal,
    /// Cash amount received, before gross-up.
    pub non_eligible_dividends: Decimal,
    /// Full gain; the inclusion rate is applied by the engine.
    pub capital_gains: Decimal,

    pub rrsp_deduction: Decimal,
    pub fhsa_deduction: Decimal,
    pub estimated_deductions: Decimal,

    /// Income tax already withheld or paid by instalment.
    pub tax_paid: Decimal,
}

/// Income components the marginal-rate estimator can perturb, in the
/// priority order used for the combined rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeKind {
    Employment,
    EligibleDividends,
    NonEligibleDividends,
    CapitalGains,
}

impl IncomeKind {
    pub const PRIORITY: [IncomeKind; 4] = [
        Self::Employment,
        Self::EligibleDividends,
        Self::NonEligibleDividends,
        Self::CapitalGains,
    ];
}

impl PersonalTaxInput {
    pub fn income(
        &self,
        kind: IncomeKind,
    ) -> Decimal {
        match kind {
            IncomeKind::Employment => self.employment_income,
            IncomeKind::EligibleDividends => self.eligible_dividends,
            IncomeKind::NonEligibleDividends => self.non_eligible_dividends,
            IncomeKind::CapitalGains => self.capital_gains,
        }
    }

    /// Copy of this input with `delta` added to one income component.
    pub fn with_added_income(
        &self,
        kind: IncomeKind,
        delta: Decimal,
    ) -> Self {
        let mut input = self.clone();
        let field = match kind {
            IncomeKind::Employment => &mut input.employment_income,
            IncomeKind::EligibleDividends => &mut input.eligible_dividends,
            IncomeKind::NonEligibleDividends => &mut input.non_eligible_dividends,
            IncomeKind::CapitalGains => &mut input.capital_gains,
        };
        *field += delta;
        input
    }

    /// First non-zero component in [`IncomeKind::PRIORITY`] order, or
    /// employment when none is set.
    pub fn primary_income_kind(&self) -> IncomeKind {
        IncomeKind::PRIORITY
            .into_iter()
            .find(|kind| !self.income(*kind).is_zero())
            .unwrap_or(IncomeKind::Employment)
    }

    /// Every amount field with its serialized name.
    pub fn amounts(&self) -> [(&'static str, Decimal); 10] {
        [
            ("employmentIncome", self.employment_income),
            ("selfEmploymentIncome", self.self_employment_income),
            ("otherIncome", self.other_income),
            ("eligibleDividends", self.eligible_dividends),
            ("nonEligibleDividends", self.non_eligible_dividends),
            ("capitalGains", self.capital_gains),
            ("rrspDeduction", self.rrsp_deduction),
            ("fhsaDeduction", self.fhsa_deduction),
            ("estimatedDeductions", self.estimated_deductions),
            ("taxPaid", self.tax_paid),
        ]
    }

    /// Sum of every income component as received.
    pub fn cash_income(&self) -> Decimal {
        self.employment_income
            + self.self_employment_income
            + self.other_income
            + self.eligible_dividends
            + self.non_eligible_dividends
            + self.capital_gains
    }
}

/// The two classes of taxable Canadian dividends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendClass {
    Eligible,
    NonEligible,
}

impl fmt::Display for DividendClass {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("eligible"),
            Self::NonEligible => f.write_str("non-eligible"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn missing_fields_default_to_zero() {
        let input: PersonalTaxInput =
            serde_json::from_str(r#"{ "year": 2024, "province": "ON", "employmentIncome": 50000 }"#)
                .unwrap();

        assert_eq!(input.employment_income, dec!(50000));
        assert_eq!(input.capital_gains, Decimal::ZERO);
        assert_eq!(input.tax_paid, Decimal::ZERO);
    }

    #[test]
    fn primary_income_kind_follows_priority() {
        let input = PersonalTaxInput {
            non_eligible_dividends: dec!(100),
            capital_gains: dec!(100),
            ..Default::default()
        };

        assert_eq!(input.primary_income_kind(), IncomeKind::NonEligibleDividends);
    }

    #[test]
    fn primary_income_kind_defaults_to_employment() {
        let input = PersonalTaxInput {
            other_income: dec!(100),
            ..Default::default()
        };

        assert_eq!(input.primary_income_kind(), IncomeKind::Employment);
    }

    #[test]
    fn with_added_income_touches_one_component() {
        let input = PersonalTaxInput {
            employment_income: dec!(1000),
            eligible_dividends: dec!(500),
            ..Default::default()
        };

        let bumped = input.with_added_income(IncomeKind::EligibleDividends, Decimal::ONE);

        assert_eq!(bumped.eligible_dividends, dec!(501));
        assert_eq!(bumped.employment_income, dec!(1000));
        assert_eq!(input.eligible_dividends, dec!(500));
    }
}
