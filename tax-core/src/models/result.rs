use rust_decimal::Decimal;
use serde::Serialize;

use crate::Jurisdiction;
use crate::dataset::ProvincialStrategy;

use super::IncomeKind;

/// Outcome of one calculation: scalar totals plus the per-stage detail they
/// were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxResult {
    pub totals: TaxTotals,
    pub breakdown: TaxBreakdown,
}

/// Headline figures, rounded to cents (rates to four places).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxTotals {
    pub total_income: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub provincial_tax: Decimal,
    /// Federal plus provincial tax.
    pub income_tax: Decimal,
    /// CPP, CPP2 and EI.
    pub payroll_levies: Decimal,
    pub total_burden: Decimal,
    pub after_tax_income: Decimal,
    pub average_rate: Decimal,
    pub marginal_rate: Decimal,
    /// Positive is a refund, negative is a balance owing.
    pub refund_or_owing: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub income: IncomeBreakdown,
    pub federal: FederalBreakdown,
    pub provincial: ProvincialBreakdown,
    pub dividends: DividendBreakdown,
    pub payroll: PayrollBreakdown,
    pub marginal: MarginalRates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionBreakdown {
    pub rrsp: Decimal,
    pub fhsa: Decimal,
    pub estimated: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeBreakdown {
    pub cash_income: Decimal,
    pub employment: Decimal,
    pub self_employment: Decimal,
    pub other: Decimal,
    pub eligible_dividends_grossed_up: Decimal,
    pub non_eligible_dividends_grossed_up: Decimal,
    pub capital_gains: Decimal,
    pub taxable_capital_gains: Decimal,
    pub total_income: Decimal,
    pub deductions: DeductionBreakdown,
    pub taxable_income: Decimal,
}

/// Tax attributable to one bracket. `upper` is `None` for the top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketLine {
    pub threshold: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTax {
    pub lines: Vec<BracketLine>,
    pub total_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditLine {
    pub name: &'static str,
    pub amount: Decimal,
    pub rate: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederalBreakdown {
    pub brackets: BracketTax,
    pub base_tax: Decimal,
    pub credits: Vec<CreditLine>,
    pub total_credits: Decimal,
    pub tax_after_credits: Decimal,
    pub dividend_tax_credit: Decimal,
    pub tax_after_dividend_credits: Decimal,
    pub minimum_tax_adjustment: Decimal,
    pub net_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurtaxLine {
    pub threshold: Decimal,
    pub rate: Decimal,
    /// Portion of the tax the rate was applied to.
    pub base: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumLine {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvincialBreakdown {
    pub jurisdiction: Jurisdiction,
    pub strategy: ProvincialStrategy,
    pub brackets: BracketTax,
    pub base_tax: Decimal,
    pub credits: Vec<CreditLine>,
    pub tax_after_credits: Decimal,
    pub surtaxes: Vec<SurtaxLine>,
    pub total_surtax: Decimal,
    pub tax_after_surtax: Decimal,
    pub minimum_tax_adjustment: Decimal,
    pub dividend_tax_credit: Decimal,
    pub tax_reduction: Decimal,
    pub tax_after_reductions: Decimal,
    pub premiums: Vec<PremiumLine>,
    pub total_premiums: Decimal,
    pub net_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DividendDetail {
    pub cash: Decimal,
    pub gross_up_rate: Decimal,
    pub grossed_up: Decimal,
    pub gross_up_amount: Decimal,
    pub federal_credit: Decimal,
    pub provincial_credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DividendBreakdown {
    pub eligible: DividendDetail,
    pub non_eligible: DividendDetail,
    pub total_grossed_up: Decimal,
    pub federal_credit: Decimal,
    pub provincial_credit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayrollBreakdown {
    pub pensionable_earnings: Decimal,
    pub cpp: Decimal,
    pub additional_pensionable_earnings: Decimal,
    pub cpp2: Decimal,
    pub insurable_earnings: Decimal,
    pub ei: Decimal,
    pub total: Decimal,
}

/// Finite-difference marginal income tax rates, one per perturbable income
/// type plus the combined rate for the input's primary income type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginalRates {
    pub employment: Decimal,
    pub eligible_dividends: Decimal,
    pub non_eligible_dividends: Decimal,
    pub capital_gains: Decimal,
    pub combined: Decimal,
    pub combined_source: IncomeKind,
}

impl MarginalRates {
    pub fn for_kind(
        &self,
        kind: IncomeKind,
    ) -> Decimal {
        match kind {
            IncomeKind::Employment => self.employment,
            IncomeKind::EligibleDividends => self.eligible_dividends,
            IncomeKind::NonEligibleDividends => self.non_eligible_dividends,
            IncomeKind::CapitalGains => self.capital_gains,
        }
    }
}
