//! Progressive bracket taxation.
//!
//! Every jurisdiction-level stage runs its schedule through [`tax_brackets`].
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxBracket;
//! use tax_core::calculations::tax_brackets;
//!
//! let brackets = vec![
//!     TaxBracket { threshold: dec!(0), rate: dec!(0.15) },
//!     TaxBracket { threshold: dec!(55867), rate: dec!(0.205) },
//! ];
//!
//! let result = tax_brackets(dec!(60000), &brackets);
//!
//! // 55,867 × 15% + 4,133 × 20.5%
//! assert_eq!(result.total_tax, dec!(9227.315));
//! assert_eq!(result.lines.len(), 2);
//! ```

use rust_decimal::Decimal;

use crate::dataset::TaxBracket;
use crate::models::{BracketLine, BracketTax};

use super::common::non_negative;

/// Taxes `taxable_income` across `brackets`.
///
/// Each bracket taxes `min(remaining, upper - threshold)` at its rate, where
/// `upper` is the next bracket's threshold. Brackets above the income still
/// produce a line with zero taxable amount so reports show the whole
/// schedule. Income at or below zero produces zero tax.
pub fn tax_brackets(
    taxable_income: Decimal,
    brackets: &[TaxBracket],
) -> BracketTax {
    let mut remaining = non_negative(taxable_income);
    let mut total_tax = Decimal::ZERO;
    let mut lines = Vec::with_capacity(brackets.len());

    for (index, bracket) in brackets.iter().enumerate() {
        let upper = brackets.get(index + 1).map(|next| next.threshold);
        let taxable_amount = match upper {
            Some(upper) => remaining.min(non_negative(upper - bracket.threshold)),
            None => remaining,
        };
        let tax = taxable_amount * bracket.rate;

        remaining -= taxable_amount;
        total_tax += tax;
        lines.push(BracketLine {
            threshold: bracket.threshold,
            upper,
            rate: bracket.rate,
            taxable_amount,
            tax,
        });
    }

    BracketTax { lines, total_tax }
}
