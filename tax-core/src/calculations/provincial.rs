//! Provincial and territorial income tax.
//!
//! Two strategies, chosen per jurisdiction when the dataset is validated:
//!
//! **Generic**
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Bracket tax on taxable income |
//! | 2    | Less basic personal amount credit, min 0 |
//! | 3    | Plus configured surtax tiers, measured on step 2 |
//! | 4    | Plus minimum tax adjustment (always 0 for now), min 0 |
//! | 5    | Less provincial dividend tax credit, min 0 |
//! | 6    | Less provincial tax reduction (always 0 for now), min 0 |
//! | 7    | Plus bracket premiums (flat amount of highest threshold reached) |
//!
//! **Ontario**
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Bracket tax on taxable income |
//! | 2    | Less basic personal amount credit, min 0 |
//! | 3    | Plus surtax: 20% over the first threshold and 36% over the second |
//! | 4    | Less dividend tax credit, min 0 |
//! | 5    | Less Ontario tax reduction (always 0 for now), min 0 |
//! | 6    | Plus Ontario Health Premium, from taxable income |

use rust_decimal::Decimal;
use tracing::debug;

use crate::dataset::{PremiumSchedule, ProvincialRules, ProvincialStrategy, Surtax};
use crate::models::{BracketTax, CreditLine, PremiumLine, ProvincialBreakdown, SurtaxLine};

use super::brackets::tax_brackets;
use super::common::{lowest_rate, non_negative};
use super::federal::{BASIC_PERSONAL_AMOUNT, named_credit_line};

/// Figures the provincial stage needs from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct ProvincialStageInput {
    pub taxable_income: Decimal,
    pub dividend_tax_credit: Decimal,
}

pub fn provincial_tax(
    input: ProvincialStageInput,
    rules: &ProvincialRules,
) -> ProvincialBreakdown {
    let breakdown = match rules.strategy {
        ProvincialStrategy::Generic => generic_provincial_tax(input, rules),
        ProvincialStrategy::Ontario => ontario_provincial_tax(input, rules),
    };

    debug!(
        jurisdiction = %rules.jurisdiction,
        strategy = ?rules.strategy,
        base_tax = %breakdown.base_tax,
        surtax = %breakdown.total_surtax,
        premiums = %breakdown.total_premiums,
        net_tax = %breakdown.net_tax,
        "provincial stage"
    );

    breakdown
}

/// Steps 1 and 2, identical for both strategies.
struct CreditedTax {
    brackets: BracketTax,
    base_tax: Decimal,
    credits: Vec<CreditLine>,
    tax_after_credits: Decimal,
}

fn credited_tax(
    taxable_income: Decimal,
    rules: &ProvincialRules,
) -> CreditedTax {
    let brackets = tax_brackets(taxable_income, &rules.brackets);
    let base_tax = brackets.total_tax;

    let lowest = lowest_rate(rules.brackets.iter().map(|bracket| bracket.rate));
    let credits: Vec<CreditLine> = rules
        .basic_personal_amount
        .iter()
        .map(|credit| named_credit_line(BASIC_PERSONAL_AMOUNT, credit, taxable_income, lowest))
        .collect();
    let total_credits: Decimal = credits.iter().map(|line| line.credit).sum();

    CreditedTax {
        brackets,
        base_tax,
        credits,
        tax_after_credits: non_negative(base_tax - total_credits),
    }
}

// =============================================================================
// generic strategy
// =============================================================================

fn generic_provincial_tax(
    input: ProvincialStageInput,
    rules: &ProvincialRules,
) -> ProvincialBreakdown {
    let credited = credited_tax(input.taxable_income, rules);
    let tax_after_credits = credited.tax_after_credits;

    let surtaxes: Vec<SurtaxLine> = rules
        .surtaxes
        .iter()
        .flat_map(|surtax| configured_surtax(tax_after_credits, surtax))
        .collect();
    let total_surtax: Decimal = surtaxes.iter().map(|line| line.amount).sum();
    let tax_after_surtax = tax_after_credits + total_surtax;

    let minimum_tax_adjustment = Decimal::ZERO;
    let after_minimum_tax = non_negative(tax_after_surtax + minimum_tax_adjustment);
    let after_dividend_credit = non_negative(after_minimum_tax - input.dividend_tax_credit);
    let tax_reduction = Decimal::ZERO;
    let tax_after_reductions = non_negative(after_dividend_credit - tax_reduction);

    let premiums: Vec<PremiumLine> = rules
        .premiums
        .iter()
        .filter_map(|premium| match &premium.schedule {
            PremiumSchedule::Brackets { brackets } => {
                let amount = brackets
                    .iter()
                    .rev()
                    .find(|bracket| input.taxable_income >= bracket.threshold)
                    .map(|bracket| bracket.amount)
                    .unwrap_or(Decimal::ZERO);
                Some(PremiumLine {
                    name: premium.name.clone(),
                    amount,
                })
            }
            // Rejected at load time for generic jurisdictions.
            PremiumSchedule::Formula { .. } => None,
        })
        .collect();
    let total_premiums: Decimal = premiums.iter().map(|line| line.amount).sum();

    ProvincialBreakdown {
        jurisdiction: rules.jurisdiction,
        strategy: rules.strategy,
        brackets: credited.brackets,
        base_tax: credited.base_tax,
        credits: credited.credits,
        tax_after_credits,
        surtaxes,
        total_surtax,
        tax_after_surtax,
        minimum_tax_adjustment,
        dividend_tax_credit: input.dividend_tax_credit,
        tax_reduction,
        tax_after_reductions,
        premiums,
        total_premiums,
        net_tax: tax_after_reductions + total_premiums,
    }
}

/// Surtax lines for one configured entry. With a second tier the excess is
/// split: the first rate applies between the two thresholds and the second
/// rate above the upper one.
fn configured_surtax(
    tax: Decimal,
    surtax: &Surtax,
) -> Vec<SurtaxLine> {
    match &surtax.second_tier {
        Some(tier) if tax > tier.threshold => {
            let lower = tier.threshold - surtax.threshold;
            let upper = tax - tier.threshold;
            vec![
                SurtaxLine {
                    threshold: surtax.threshold,
                    rate: surtax.rate,
                    base: lower,
                    amount: lower * surtax.rate,
                },
                SurtaxLine {
                    threshold: tier.threshold,
                    rate: tier.rate,
                    base: upper,
                    amount: upper * tier.rate,
                },
            ]
        }
        _ => {
            let base = non_negative(tax - surtax.threshold);
            vec![SurtaxLine {
                threshold: surtax.threshold,
                rate: surtax.rate,
                base,
                amount: base * surtax.rate,
            }]
        }
    }
}

// =============================================================================
// Ontario strategy
// =============================================================================

const fn whole(value: u32) -> Decimal {
    Decimal::from_parts(value, 0, 0, false, 0)
}

const fn hundredths(value: u32) -> Decimal {
    Decimal::from_parts(value, 0, 0, false, 2)
}

const ONTARIO_SURTAX_RATE: Decimal = hundredths(20);
const ONTARIO_SURTAX_RATE2: Decimal = hundredths(36);

pub const ONTARIO_HEALTH_PREMIUM: &str = "Ontario Health Premium";

/// One rising segment of the Ontario Health Premium: above `from` the
/// premium is `base + rate × (income − from)`, capped at `cap`.
struct HealthPremiumBand {
    from: Decimal,
    base: Decimal,
    rate: Decimal,
    cap: Decimal,
}

const HEALTH_PREMIUM_BANDS: [HealthPremiumBand; 5] = [
    HealthPremiumBand {
        from: whole(20_000),
        base: whole(0),
        rate: hundredths(6),
        cap: whole(300),
    },
    HealthPremiumBand {
        from: whole(36_000),
        base: whole(300),
        rate: hundredths(6),
        cap: whole(450),
    },
    HealthPremiumBand {
        from: whole(48_000),
        base: whole(450),
        rate: hundredths(25),
        cap: whole(600),
    },
    HealthPremiumBand {
        from: whole(72_000),
        base: whole(600),
        rate: hundredths(25),
        cap: whole(750),
    },
    HealthPremiumBand {
        from: whole(200_000),
        base: whole(750),
        rate: hundredths(25),
        cap: whole(900),
    },
];

/// Ontario Health Premium for a taxable income. Zero up to $20,000, then
/// alternating rising segments and flat plateaus up to $900 above $200,600.
pub fn ontario_health_premium(taxable_income: Decimal) -> Decimal {
    HEALTH_PREMIUM_BANDS
        .iter()
        .rev()
        .find(|band| taxable_income > band.from)
        .map(|band| (band.base + band.rate * (taxable_income - band.from)).min(band.cap))
        .unwrap_or(Decimal::ZERO)
}

fn ontario_surtax(
    tax: Decimal,
    rules: &ProvincialRules,
) -> Vec<SurtaxLine> {
    // Validation guarantees a two-tier entry for Ontario.
    let Some((threshold, threshold2)) = rules.surtaxes.iter().find_map(|surtax| {
        surtax
            .second_tier
            .as_ref()
            .map(|tier| (surtax.threshold, tier.threshold))
    }) else {
        return Vec::new();
    };

    let base = non_negative(tax - threshold);
    let base2 = non_negative(tax - threshold2);
    vec![
        SurtaxLine {
            threshold,
            rate: ONTARIO_SURTAX_RATE,
            base,
            amount: base * ONTARIO_SURTAX_RATE,
        },
        SurtaxLine {
            threshold: threshold2,
            rate: ONTARIO_SURTAX_RATE2,
            base: base2,
            amount: base2 * ONTARIO_SURTAX_RATE2,
        },
    ]
}

fn ontario_provincial_tax(
    input: ProvincialStageInput,
    rules: &ProvincialRules,
) -> ProvincialBreakdown {
    let credited = credited_tax(input.taxable_income, rules);
    let tax_after_credits = credited.tax_after_credits;

    let surtaxes = ontario_surtax(tax_after_credits, rules);
    let total_surtax: Decimal = surtaxes.iter().map(|line| line.amount).sum();
    let tax_after_surtax = tax_after_credits + total_surtax;

    let after_dividend_credit = non_negative(tax_after_surtax - input.dividend_tax_credit);
    let tax_reduction = Decimal::ZERO;
    let tax_after_reductions = non_negative(after_dividend_credit - tax_reduction);

    let health_premium = ontario_health_premium(input.taxable_income);
    let premiums = vec![PremiumLine {
        name: ONTARIO_HEALTH_PREMIUM.to_string(),
        amount: health_premium,
    }];

    ProvincialBreakdown {
        jurisdiction: rules.jurisdiction,
        strategy: rules.strategy,
        brackets: credited.brackets,
        base_tax: credited.base_tax,
        credits: credited.credits,
        tax_after_credits,
        surtaxes,
        total_surtax,
        tax_after_surtax,
        minimum_tax_adjustment: Decimal::ZERO,
        dividend_tax_credit: input.dividend_tax_credit,
        tax_reduction,
        tax_after_reductions,
        premiums,
        total_premiums: health_premium,
        net_tax: tax_after_reductions + health_premium,
    }
}
