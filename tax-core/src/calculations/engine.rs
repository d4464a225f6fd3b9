//! End-to-end personal income tax calculation.
//!
//! | Stage | Description |
//! |-------|-------------|
//! | 1     | Resolve the province through the jurisdiction alias table |
//! | 2     | Gross up dividends and compute both dividend tax credits |
//! | 3     | Aggregate income, apply deductions → taxable income |
//! | 4     | CPP, CPP2 and EI on employment income |
//! | 5     | Federal tax |
//! | 6     | Provincial tax, by the jurisdiction's strategy |
//! | 7     | Marginal rates, by re-running stages 1–6 with perturbed income |
//! | 8     | Totals, rounded to cents |
//!
//! The engine is a pure function of `(input, dataset)`. It never rejects
//! economically odd inputs such as negative income; those are logged and
//! passed through.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::dataset::TaxYearDataset;
use crate::error::TaxError;
use crate::models::{
    DeductionBreakdown, DividendBreakdown, FederalBreakdown, IncomeBreakdown, MarginalRates,
    PayrollBreakdown, PersonalTaxInput, ProvincialBreakdown, TaxBreakdown, TaxResult, TaxTotals,
};

use super::common::{non_negative, round_half_up, round_rate};
use super::dividends::dividend_breakdown;
use super::federal::{FederalStageInput, federal_tax};
use super::marginal::marginal_rates_from;
use super::payroll::payroll_levies;
use super::provincial::{ProvincialStageInput, provincial_tax};

/// Largest magnitude accepted for any input amount ($1 quadrillion). Every
/// stage, the marginal perturbation included, stays within `Decimal` range
/// for amounts up to this bound.
pub const MAX_INPUT_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Computes the full tax result for `input` against `dataset`.
///
/// # Errors
///
/// - [`TaxError::YearMismatch`] when `input.year` is not the dataset's year.
/// - [`TaxError::AmountOutOfRange`] when an amount exceeds
///   [`MAX_INPUT_AMOUNT`] in magnitude.
/// - [`TaxError::UnknownJurisdiction`] / [`TaxError::JurisdictionNotConfigured`]
///   when the province cannot be resolved.
/// - [`TaxError::MissingDividendCreditRate`] when a provincial dividend
///   credit has no rate for the province.
pub fn calculate(
    input: &PersonalTaxInput,
    dataset: &TaxYearDataset,
) -> Result<TaxResult, TaxError> {
    if input.year != dataset.year() {
        return Err(TaxError::YearMismatch {
            input: input.year,
            dataset: dataset.year(),
        });
    }

    check_input_range(input)?;
    warn_on_suspicious_input(input);

    let pipeline = run_pipeline(input, dataset)?;
    let marginal = marginal_rates_from(input, dataset, pipeline.income_tax())?;
    let totals = totals(input, &pipeline, &marginal);

    debug!(
        province = %pipeline.provincial.jurisdiction,
        taxable_income = %totals.taxable_income,
        income_tax = %totals.income_tax,
        marginal_rate = %totals.marginal_rate,
        "calculation complete"
    );

    Ok(TaxResult {
        totals,
        breakdown: TaxBreakdown {
            income: pipeline.income,
            federal: pipeline.federal,
            provincial: pipeline.provincial,
            dividends: pipeline.dividends,
            payroll: pipeline.payroll,
            marginal,
        },
    })
}

/// Every stage except the marginal estimator, unrounded.
#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    pub income: IncomeBreakdown,
    pub dividends: DividendBreakdown,
    pub payroll: PayrollBreakdown,
    pub federal: FederalBreakdown,
    pub provincial: ProvincialBreakdown,
}

impl Pipeline {
    /// Federal plus provincial net tax.
    pub fn income_tax(&self) -> Decimal {
        self.federal.net_tax + self.provincial.net_tax
    }
}

pub(crate) fn run_pipeline(
    input: &PersonalTaxInput,
    dataset: &TaxYearDataset,
) -> Result<Pipeline, TaxError> {
    let rules = dataset.province(&input.province)?;

    let dividends = dividend_breakdown(
        input.eligible_dividends,
        input.non_eligible_dividends,
        dataset.dividends(),
        rules.jurisdiction,
    )?;

    let income = aggregate_income(
        input,
        &dividends,
        dataset.federal().capital_gains_inclusion_rate,
    );

    let payroll = payroll_levies(input.employment_income, dataset.payroll());

    let federal = federal_tax(
        FederalStageInput {
            taxable_income: income.taxable_income,
            employment_income: input.employment_income,
            payroll: &payroll,
            dividend_tax_credit: dividends.federal_credit,
        },
        dataset.federal(),
    );

    let provincial = provincial_tax(
        ProvincialStageInput {
            taxable_income: income.taxable_income,
            dividend_tax_credit: dividends.provincial_credit,
        },
        rules,
    );

    Ok(Pipeline {
        income,
        dividends,
        payroll,
        federal,
        provincial,
    })
}

/// Grossed-up dividends replace the cash amounts; capital gains enter at the
/// inclusion rate.
fn aggregate_income(
    input: &PersonalTaxInput,
    dividends: &DividendBreakdown,
    inclusion_rate: Decimal,
) -> IncomeBreakdown {
    let taxable_capital_gains = input.capital_gains * inclusion_rate;
    let total_income = input.employment_income
        + input.self_employment_income
        + input.other_income
        + dividends.eligible.grossed_up
        + dividends.non_eligible.grossed_up
        + taxable_capital_gains;

    let deductions = DeductionBreakdown {
        rrsp: input.rrsp_deduction,
        fhsa: input.fhsa_deduction,
        estimated: input.estimated_deductions,
        total: input.rrsp_deduction + input.fhsa_deduction + input.estimated_deductions,
    };
    let taxable_income = non_negative(total_income - deductions.total);

    IncomeBreakdown {
        cash_income: input.cash_income(),
        employment: input.employment_income,
        self_employment: input.self_employment_income,
        other: input.other_income,
        eligible_dividends_grossed_up: dividends.eligible.grossed_up,
        non_eligible_dividends_grossed_up: dividends.non_eligible.grossed_up,
        capital_gains: input.capital_gains,
        taxable_capital_gains,
        total_income,
        deductions,
        taxable_income,
    }
}

fn totals(
    input: &PersonalTaxInput,
    pipeline: &Pipeline,
    marginal: &MarginalRates,
) -> TaxTotals {
    let income_tax = pipeline.income_tax();
    let payroll_levies = pipeline.payroll.total;
    let total_burden = income_tax + payroll_levies;
    let cash_income = pipeline.income.cash_income;

    let average_rate = if cash_income > Decimal::ZERO {
        income_tax / cash_income
    } else {
        Decimal::ZERO
    };

    TaxTotals {
        total_income: round_half_up(pipeline.income.total_income),
        taxable_income: round_half_up(pipeline.income.taxable_income),
        federal_tax: round_half_up(pipeline.federal.net_tax),
        provincial_tax: round_half_up(pipeline.provincial.net_tax),
        income_tax: round_half_up(income_tax),
        payroll_levies: round_half_up(payroll_levies),
        total_burden: round_half_up(total_burden),
        after_tax_income: round_half_up(cash_income - total_burden),
        average_rate: round_rate(average_rate),
        marginal_rate: round_rate(marginal.combined),
        refund_or_owing: round_half_up(input.tax_paid - income_tax),
    }
}

pub(crate) fn check_input_range(input: &PersonalTaxInput) -> Result<(), TaxError> {
    match input
        .amounts()
        .into_iter()
        .find(|(_, value)| value.abs() > MAX_INPUT_AMOUNT)
    {
        Some((field, value)) => Err(TaxError::AmountOutOfRange {
            field: field.to_string(),
            value,
            limit: MAX_INPUT_AMOUNT,
        }),
        None => Ok(()),
    }
}

fn warn_on_suspicious_input(input: &PersonalTaxInput) {
    for (field, value) in input.amounts() {
        if value < Decimal::ZERO {
            warn!(field, %value, "negative amount passed through unchanged");
        }
    }

    let deductions = input.rrsp_deduction + input.fhsa_deduction + input.estimated_deductions;
    if deductions > input.cash_income() {
        warn!(
            %deductions,
            cash_income = %input.cash_income(),
            "deductions exceed income; taxable income floors at zero"
        );
    }
}
