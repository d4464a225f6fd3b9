//! Dividend gross-up and dividend tax credits.
//!
//! The grossed-up amount replaces the cash dividend in taxable income; the
//! federal and provincial credits computed here are subtracted later by the
//! owning tax stage.

use rust_decimal::Decimal;
use tracing::debug;

use crate::Jurisdiction;
use crate::dataset::{CreditBase, DividendClassRules, DividendCredit, DividendSchema};
use crate::error::TaxError;
use crate::models::{DividendBreakdown, DividendClass, DividendDetail};

/// Grosses up one dividend class and computes both of its credits.
///
/// # Errors
///
/// [`TaxError::MissingDividendCreditRate`] when the provincial rate map has
/// no entry for `jurisdiction`.
pub fn dividend_detail(
    class: DividendClass,
    cash: Decimal,
    rules: &DividendClassRules,
    jurisdiction: Jurisdiction,
) -> Result<DividendDetail, TaxError> {
    let grossed_up = cash * rules.gross_up_rate;
    let gross_up_amount = cash * (rules.gross_up_rate - Decimal::ONE);

    let federal_credit = credit_amount(
        class,
        &rules.federal_credit,
        cash,
        grossed_up,
        jurisdiction,
    )?;
    let provincial_credit = credit_amount(
        class,
        &rules.provincial_credit,
        cash,
        grossed_up,
        jurisdiction,
    )?;

    Ok(DividendDetail {
        cash,
        gross_up_rate: rules.gross_up_rate,
        grossed_up,
        gross_up_amount,
        federal_credit,
        provincial_credit,
    })
}

/// `base × rate`, with the base chosen by the credit's configuration.
pub fn credit_amount(
    class: DividendClass,
    credit: &DividendCredit,
    cash: Decimal,
    grossed_up: Decimal,
    jurisdiction: Jurisdiction,
) -> Result<Decimal, TaxError> {
    let base = match credit.base {
        CreditBase::Cash => cash,
        CreditBase::GrossedUp => grossed_up,
    };
    let rate = credit.rate_for(class, jurisdiction)?;
    Ok(base * rate)
}

/// Runs both dividend classes for one jurisdiction.
pub fn dividend_breakdown(
    eligible_cash: Decimal,
    non_eligible_cash: Decimal,
    schema: &DividendSchema,
    jurisdiction: Jurisdiction,
) -> Result<DividendBreakdown, TaxError> {
    let eligible = dividend_detail(
        DividendClass::Eligible,
        eligible_cash,
        schema.class(DividendClass::Eligible),
        jurisdiction,
    )?;
    let non_eligible = dividend_detail(
        DividendClass::NonEligible,
        non_eligible_cash,
        schema.class(DividendClass::NonEligible),
        jurisdiction,
    )?;

    let breakdown = DividendBreakdown {
        total_grossed_up: eligible.grossed_up + non_eligible.grossed_up,
        federal_credit: eligible.federal_credit + non_eligible.federal_credit,
        provincial_credit: eligible.provincial_credit + non_eligible.provincial_credit,
        eligible,
        non_eligible,
    };

    debug!(
        %jurisdiction,
        grossed_up = %breakdown.total_grossed_up,
        federal_credit = %breakdown.federal_credit,
        provincial_credit = %breakdown.provincial_credit,
        "dividend stage"
    );

    Ok(breakdown)
}
