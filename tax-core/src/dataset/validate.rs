//! Raw-to-validated dataset conversion.
//!
//! Each check reports the first violation it finds with the full field path.
//! Jurisdiction keys in `provinces.json` and in provincial dividend rate maps
//! go through [`Jurisdiction::normalize`]; when a two-letter code and a full
//! name resolve to the same jurisdiction the code entry is kept and the name
//! entry is dropped.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::raw::{
    RawBracket, RawCreditRate, RawDataset, RawDividendClass, RawDividendCredit, RawFederal,
    RawNamedCredit, RawPayroll, RawPremium, RawProvince, RawSurtax,
};
use super::{
    CppRules, Cpp2Rules, CreditBase, CreditRate, DividendClassRules, DividendCredit,
    DividendSchema, EiRules, FederalCredits, FederalRules, MIN_JURISDICTIONS, NamedCredit,
    PayrollRules, PhaseOut, Premium, PremiumBracket, PremiumSchedule, ProvincialRules,
    ProvincialStrategy, REFERENCE_JURISDICTION, Surtax, SurtaxTier, TaxBracket, TaxYearDataset,
};
use crate::Jurisdiction;
use crate::error::ValidationError;

const DEFAULT_CAPITAL_GAINS_INCLUSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

pub(super) fn validate(
    year: i32,
    raw: RawDataset,
) -> Result<TaxYearDataset, ValidationError> {
    check_year("federal", year, raw.federal.year)?;
    check_year("provinces", year, raw.provinces.year)?;
    check_year("payroll", year, raw.payroll.year)?;
    check_year("dividends", year, raw.dividends.year)?;

    let federal = validate_federal(&raw.federal)?;
    let provinces = validate_provinces(&raw.provinces.provinces)?;
    let payroll = validate_payroll(&raw.payroll)?;
    let dividends = DividendSchema {
        eligible: validate_dividend_class("dividends.eligible", &raw.dividends.eligible)?,
        non_eligible: validate_dividend_class(
            "dividends.nonEligible",
            &raw.dividends.non_eligible,
        )?,
    };

    debug!(
        year,
        jurisdictions = provinces.len(),
        federal_brackets = federal.brackets.len(),
        "dataset validated"
    );

    Ok(TaxYearDataset {
        year,
        federal,
        provinces,
        payroll,
        dividends,
    })
}

fn check_year(
    document: &str,
    expected: i32,
    found: Option<i32>,
) -> Result<(), ValidationError> {
    match found {
        Some(found) if found != expected => Err(ValidationError::YearMismatch {
            path: format!("{document}.year"),
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// scalar checks
// =============================================================================

fn amount(
    path: impl Into<String>,
    value: Decimal,
) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            path: path.into(),
            value,
        });
    }
    Ok(value)
}

fn rate(
    path: impl Into<String>,
    value: Decimal,
) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::RateOutOfBounds {
            path: path.into(),
            value,
        });
    }
    Ok(value)
}

// =============================================================================
// brackets and credits
// =============================================================================

fn validate_brackets(
    path: &str,
    raw: &[RawBracket],
) -> Result<Vec<TaxBracket>, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyBrackets {
            path: path.to_string(),
        });
    }

    let mut brackets = Vec::with_capacity(raw.len());
    let mut previous: Option<Decimal> = None;
    for (index, bracket) in raw.iter().enumerate() {
        let threshold = amount(format!("{path}[{index}].threshold"), bracket.threshold)?;
        let rate = rate(format!("{path}[{index}].rate"), bracket.rate)?;
        if let Some(previous) = previous.filter(|previous| threshold < *previous) {
            return Err(ValidationError::ThresholdsNotAscending {
                path: format!("{path}[{index}].threshold"),
                threshold,
                previous,
            });
        }
        previous = Some(threshold);
        brackets.push(TaxBracket { threshold, rate });
    }
    Ok(brackets)
}

fn validate_named_credit(
    path: &str,
    raw: &RawNamedCredit,
) -> Result<NamedCredit, ValidationError> {
    let credit_amount = amount(format!("{path}.amount"), raw.amount)?;
    let credit_rate = raw
        .rate
        .map(|value| rate(format!("{path}.rate"), value))
        .transpose()?;

    let phase_out = match &raw.phase_out {
        None => None,
        Some(phase_out) => {
            let start = amount(format!("{path}.phaseOut.start"), phase_out.start)?;
            let end = amount(format!("{path}.phaseOut.end"), phase_out.end)?;
            let minimum_amount = amount(
                format!("{path}.phaseOut.minimumAmount"),
                phase_out.minimum_amount,
            )?;
            if start > end {
                return Err(ValidationError::PhaseOutRange {
                    path: format!("{path}.phaseOut"),
                    start,
                    end,
                });
            }
            if minimum_amount > credit_amount {
                return Err(ValidationError::PhaseOutMinimum {
                    path: format!("{path}.phaseOut.minimumAmount"),
                    minimum: minimum_amount,
                    amount: credit_amount,
                });
            }
            Some(PhaseOut {
                start,
                end,
                minimum_amount,
            })
        }
    };

    Ok(NamedCredit {
        amount: credit_amount,
        rate: credit_rate,
        phase_out,
    })
}

fn validate_federal(raw: &RawFederal) -> Result<FederalRules, ValidationError> {
    let brackets = validate_brackets("federal.brackets", &raw.brackets)?;

    let credits = FederalCredits {
        basic_personal_amount: raw
            .credits
            .basic_personal_amount
            .as_ref()
            .map(|credit| validate_named_credit("federal.credits.basicPersonalAmount", credit))
            .transpose()?,
        employment_amount: raw
            .credits
            .employment_amount
            .as_ref()
            .map(|credit| validate_named_credit("federal.credits.employmentAmount", credit))
            .transpose()?,
        cpp_ei_rate: raw
            .credits
            .cpp_ei
            .as_ref()
            .and_then(|credit| credit.rate)
            .map(|value| rate("federal.credits.cppEi.rate", value))
            .transpose()?,
    };

    let capital_gains_inclusion_rate = match raw.capital_gains_inclusion_rate {
        Some(value) => rate("federal.capitalGainsInclusionRate", value)?,
        None => DEFAULT_CAPITAL_GAINS_INCLUSION_RATE,
    };

    Ok(FederalRules {
        brackets,
        credits,
        capital_gains_inclusion_rate,
    })
}

// =============================================================================
// jurisdictions
// =============================================================================

/// Resolves every key of a jurisdiction-keyed map.
///
/// Entries keyed by a two-letter code are taken first. A name-keyed entry
/// is then dropped if its code is already present from a code-keyed entry,
/// and rejected if another name already claimed the same code.
fn normalize_keys<'a, T>(
    path: &str,
    raw: &'a BTreeMap<String, T>,
) -> Result<BTreeMap<Jurisdiction, (&'a str, &'a T)>, ValidationError> {
    let mut resolved: BTreeMap<Jurisdiction, (&str, &T)> = BTreeMap::new();

    for (key, value) in raw {
        if let Some(code) = Jurisdiction::from_code(key) {
            if resolved.insert(code, (key.as_str(), value)).is_some() {
                return Err(ValidationError::DuplicateJurisdiction {
                    path: format!("{path}.{key}"),
                    key: key.clone(),
                    code,
                });
            }
        }
    }

    let mut from_names: Vec<Jurisdiction> = Vec::new();
    for (key, value) in raw {
        if Jurisdiction::from_code(key).is_some() {
            continue;
        }
        let code = Jurisdiction::normalize(key).ok_or_else(|| {
            ValidationError::UnknownJurisdiction {
                path: format!("{path}.{key}"),
                key: key.clone(),
            }
        })?;

        if from_names.contains(&code) {
            return Err(ValidationError::DuplicateJurisdiction {
                path: format!("{path}.{key}"),
                key: key.clone(),
                code,
            });
        }
        if resolved.contains_key(&code) {
            debug!(key = %key, %code, "dropping name-keyed entry shadowed by its code");
            continue;
        }
        from_names.push(code);
        resolved.insert(code, (key.as_str(), value));
    }

    Ok(resolved)
}

fn validate_provinces(
    raw: &BTreeMap<String, RawProvince>,
) -> Result<BTreeMap<Jurisdiction, ProvincialRules>, ValidationError> {
    let resolved = normalize_keys("provinces", raw)?;

    let mut provinces = BTreeMap::new();
    for (jurisdiction, (_, province)) in resolved {
        let rules = validate_province(jurisdiction, province)?;
        provinces.insert(jurisdiction, rules);
    }

    if provinces.len() < MIN_JURISDICTIONS {
        return Err(ValidationError::TooFewJurisdictions {
            path: "provinces".to_string(),
            found: provinces.len(),
            required: MIN_JURISDICTIONS,
        });
    }

    Ok(provinces)
}

fn validate_province(
    jurisdiction: Jurisdiction,
    raw: &RawProvince,
) -> Result<ProvincialRules, ValidationError> {
    let path = format!("provinces.{jurisdiction}");
    let brackets = validate_brackets(&format!("{path}.brackets"), &raw.brackets)?;

    let basic_personal_amount = raw
        .credits
        .basic_personal_amount
        .as_ref()
        .map(|credit| {
            validate_named_credit(&format!("{path}.credits.basicPersonalAmount"), credit)
        })
        .transpose()?;

    let surtaxes = raw
        .surtaxes
        .iter()
        .enumerate()
        .map(|(index, surtax)| validate_surtax(&format!("{path}.surtaxes[{index}]"), surtax))
        .collect::<Result<Vec<_>, _>>()?;

    let premiums = raw
        .premiums
        .iter()
        .enumerate()
        .map(|(index, premium)| validate_premium(&format!("{path}.premiums[{index}]"), premium))
        .collect::<Result<Vec<_>, _>>()?;

    let strategy = ProvincialStrategy::for_jurisdiction(jurisdiction);
    // Only the Ontario strategy computes a premium from a formula.
    if strategy == ProvincialStrategy::Generic {
        let formula = premiums
            .iter()
            .enumerate()
            .find_map(|(index, premium)| match &premium.schedule {
                PremiumSchedule::Formula { formula } => Some((index, formula)),
                PremiumSchedule::Brackets { .. } => None,
            });
        if let Some((index, formula)) = formula {
            return Err(ValidationError::UnsupportedPremiumFormula {
                path: format!("{path}.premiums[{index}].formula"),
                jurisdiction,
                formula: formula.clone(),
            });
        }
    }
    if strategy == ProvincialStrategy::Ontario
        && !surtaxes.iter().any(|surtax| surtax.second_tier.is_some())
    {
        return Err(ValidationError::MissingSurtaxTiers {
            path: format!("{path}.surtaxes"),
            jurisdiction,
        });
    }

    Ok(ProvincialRules {
        jurisdiction,
        strategy,
        brackets,
        basic_personal_amount,
        surtaxes,
        premiums,
    })
}

fn validate_surtax(
    path: &str,
    raw: &RawSurtax,
) -> Result<Surtax, ValidationError> {
    let threshold = amount(format!("{path}.threshold"), raw.threshold)?;
    let surtax_rate = rate(format!("{path}.rate"), raw.rate)?;

    let second_tier = match (raw.threshold2, raw.rate2) {
        (None, None) => None,
        (Some(threshold2), Some(rate2)) => {
            let threshold2 = amount(format!("{path}.threshold2"), threshold2)?;
            let rate2 = rate(format!("{path}.rate2"), rate2)?;
            if threshold2 < threshold {
                return Err(ValidationError::SurtaxTierOrder {
                    path: format!("{path}.threshold2"),
                    threshold,
                    threshold2,
                });
            }
            Some(SurtaxTier {
                threshold: threshold2,
                rate: rate2,
            })
        }
        _ => {
            return Err(ValidationError::IncompleteSurtaxTier {
                path: path.to_string(),
            });
        }
    };

    Ok(Surtax {
        threshold,
        rate: surtax_rate,
        second_tier,
    })
}

fn validate_premium(
    path: &str,
    raw: &RawPremium,
) -> Result<Premium, ValidationError> {
    let schedule = match (&raw.formula, &raw.brackets) {
        (Some(formula), None) => PremiumSchedule::Formula {
            formula: formula.clone(),
        },
        (None, Some(raw_brackets)) => {
            if raw_brackets.is_empty() {
                return Err(ValidationError::EmptyBrackets {
                    path: format!("{path}.brackets"),
                });
            }
            let mut brackets = Vec::with_capacity(raw_brackets.len());
            let mut previous: Option<Decimal> = None;
            for (index, bracket) in raw_brackets.iter().enumerate() {
                let threshold =
                    amount(format!("{path}.brackets[{index}].threshold"), bracket.threshold)?;
                let premium_amount =
                    amount(format!("{path}.brackets[{index}].amount"), bracket.amount)?;
                if let Some(previous) = previous.filter(|previous| threshold < *previous) {
                    return Err(ValidationError::ThresholdsNotAscending {
                        path: format!("{path}.brackets[{index}].threshold"),
                        threshold,
                        previous,
                    });
                }
                previous = Some(threshold);
                brackets.push(PremiumBracket {
                    threshold,
                    amount: premium_amount,
                });
            }
            PremiumSchedule::Brackets { brackets }
        }
        _ => {
            return Err(ValidationError::AmbiguousPremium {
                path: path.to_string(),
            });
        }
    };

    Ok(Premium {
        name: raw.name.clone().unwrap_or_else(|| "premium".to_string()),
        schedule,
    })
}

// =============================================================================
// payroll
// =============================================================================

fn validate_payroll(raw: &RawPayroll) -> Result<PayrollRules, ValidationError> {
    let cpp = CppRules {
        rate: rate("payroll.cpp.rate", raw.cpp.rate)?,
        basic_exemption: amount("payroll.cpp.basicExemption", raw.cpp.basic_exemption)?,
        max_pensionable_earnings: amount(
            "payroll.cpp.maxPensionableEarnings",
            raw.cpp.max_pensionable_earnings,
        )?,
        max_contribution: amount("payroll.cpp.maxContribution", raw.cpp.max_contribution)?,
    };
    if cpp.basic_exemption > cpp.max_pensionable_earnings {
        return Err(ValidationError::ExemptionAboveMaximum {
            path: "payroll.cpp.basicExemption".to_string(),
            exemption: cpp.basic_exemption,
            maximum: cpp.max_pensionable_earnings,
        });
    }

    let cpp2 = match &raw.cpp2 {
        None => None,
        Some(cpp2) => Some(Cpp2Rules {
            rate: rate("payroll.cpp2.rate", cpp2.rate)?,
            max_additional_earnings: amount(
                "payroll.cpp2.maxAdditionalEarnings",
                cpp2.max_additional_earnings,
            )?,
            max_additional_contribution: amount(
                "payroll.cpp2.maxAdditionalContribution",
                cpp2.max_additional_contribution,
            )?,
        }),
    };

    let ei = EiRules {
        rate: rate("payroll.ei.rate", raw.ei.rate)?,
        max_insurable_earnings: amount(
            "payroll.ei.maxInsurableEarnings",
            raw.ei.max_insurable_earnings,
        )?,
        max_premium: amount("payroll.ei.maxPremium", raw.ei.max_premium)?,
    };

    Ok(PayrollRules { cpp, cpp2, ei })
}

// =============================================================================
// dividends
// =============================================================================

fn validate_dividend_class(
    path: &str,
    raw: &RawDividendClass,
) -> Result<DividendClassRules, ValidationError> {
    if raw.gross_up_rate <= Decimal::ONE {
        return Err(ValidationError::GrossUpRate {
            path: format!("{path}.grossUpRate"),
            value: raw.gross_up_rate,
        });
    }

    let federal_credit =
        validate_dividend_credit(&format!("{path}.credits.federal"), &raw.credits.federal)?;
    if matches!(federal_credit.rate, CreditRate::ByJurisdiction(_)) {
        return Err(ValidationError::FederalRateNotFlat {
            path: format!("{path}.credits.federal.rate"),
        });
    }

    let provincial_credit = validate_dividend_credit(
        &format!("{path}.credits.provincial"),
        &raw.credits.provincial,
    )?;

    Ok(DividendClassRules {
        gross_up_rate: raw.gross_up_rate,
        federal_credit,
        provincial_credit,
    })
}

fn validate_dividend_credit(
    path: &str,
    raw: &RawDividendCredit,
) -> Result<DividendCredit, ValidationError> {
    let base = match raw.base.as_deref() {
        None => {
            return Err(ValidationError::MissingCreditBase {
                path: format!("{path}.base"),
            });
        }
        Some(value) => CreditBase::parse(value).ok_or_else(|| ValidationError::InvalidCreditBase {
            path: format!("{path}.base"),
            value: value.to_string(),
        })?,
    };

    let credit_rate = match &raw.rate {
        RawCreditRate::Flat(value) => CreditRate::Flat(rate(format!("{path}.rate"), *value)?),
        RawCreditRate::ByJurisdiction(rates) => {
            let map_path = format!("{path}.rate");
            let resolved = normalize_keys(&map_path, rates)?;
            let mut normalized = BTreeMap::new();
            for (jurisdiction, (key, value)) in resolved {
                normalized.insert(jurisdiction, rate(format!("{map_path}.{key}"), *value)?);
            }
            if !normalized.contains_key(&REFERENCE_JURISDICTION) {
                return Err(ValidationError::MissingReferenceJurisdiction {
                    path: map_path,
                    code: REFERENCE_JURISDICTION,
                });
            }
            if normalized.len() < Jurisdiction::ALL.len() {
                warn!(
                    path = %map_path,
                    configured = normalized.len(),
                    "dividend credit rate map does not cover every jurisdiction"
                );
            }
            CreditRate::ByJurisdiction(normalized)
        }
    };

    Ok(DividendCredit {
        base,
        rate: credit_rate,
    })
}
