mod input;
mod result;

pub use input::{DividendClass, IncomeKind, PersonalTaxInput};
pub use result::{
    BracketLine, BracketTax, CreditLine, DeductionBreakdown, DividendBreakdown, DividendDetail,
    FederalBreakdown, IncomeBreakdown, MarginalRates, PayrollBreakdown, PremiumLine,
    ProvincialBreakdown, SurtaxLine, TaxBreakdown, TaxResult, TaxTotals,
};
