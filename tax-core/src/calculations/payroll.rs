//! CPP, CPP2 and EI contributions on employment income.
//!
//! Self-employment and other income are not levied here.

use rust_decimal::Decimal;
use tracing::debug;

use crate::dataset::PayrollRules;
use crate::models::PayrollBreakdown;

use super::common::non_negative;

/// Computes every payroll levy for the given employment income.
pub fn payroll_levies(
    employment_income: Decimal,
    rules: &PayrollRules,
) -> PayrollBreakdown {
    let cpp_rules = &rules.cpp;

    let capped = non_negative(employment_income).min(cpp_rules.max_pensionable_earnings);
    let pensionable_earnings = non_negative(capped - cpp_rules.basic_exemption);
    let cpp = (pensionable_earnings * cpp_rules.rate).min(cpp_rules.max_contribution);

    let (additional_pensionable_earnings, cpp2) = match &rules.cpp2 {
        Some(cpp2) if employment_income > cpp_rules.max_pensionable_earnings => {
            let ceiling = cpp_rules.max_pensionable_earnings + cpp2.max_additional_earnings;
            let additional = employment_income.min(ceiling) - cpp_rules.max_pensionable_earnings;
            let contribution = (additional * cpp2.rate).min(cpp2.max_additional_contribution);
            (additional, contribution)
        }
        _ => (Decimal::ZERO, Decimal::ZERO),
    };

    let insurable_earnings = non_negative(employment_income).min(rules.ei.max_insurable_earnings);
    let ei = (insurable_earnings * rules.ei.rate).min(rules.ei.max_premium);

    let total = cpp + cpp2 + ei;
    debug!(%employment_income, %cpp, %cpp2, %ei, "payroll stage");

    PayrollBreakdown {
        pensionable_earnings,
        cpp,
        additional_pensionable_earnings,
        cpp2,
        insurable_earnings,
        ei,
        total,
    }
}
