//! Tax-year datasets.
//!
//! A dataset exists in two forms. [`raw`] holds the documents as parsed,
//! with free-form jurisdiction keys and optional fields. [`TaxYearDataset`]
//! is the validated form: its fields are private, it can only be built by
//! [`TaxYearDataset::from_raw`], and it hands out shared references only.
//! Every calculation takes `&TaxYearDataset`, so nothing downstream of
//! validation can observe or produce an unvalidated or mutated dataset.

pub mod raw;
mod validate;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::Jurisdiction;
use crate::error::TaxError;
use crate::models::DividendClass;

pub use raw::RawDataset;

/// Fewest jurisdictions a dataset may contain after alias normalization.
pub const MIN_JURISDICTIONS: usize = 5;

/// Jurisdiction every provincial dividend rate map must cover.
pub const REFERENCE_JURISDICTION: Jurisdiction = Jurisdiction::ON;

/// One band of a progressive schedule. The band runs from `threshold` up to
/// the next bracket's threshold, or without limit for the last bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxBracket {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Linear reduction of a credit amount between two income levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseOut {
    pub start: Decimal,
    pub end: Decimal,
    pub minimum_amount: Decimal,
}

/// A non-refundable credit claimed as `amount × rate`.
///
/// When `rate` is `None` the lowest bracket rate of the owning schedule
/// applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCredit {
    pub amount: Decimal,
    pub rate: Option<Decimal>,
    pub phase_out: Option<PhaseOut>,
}

impl NamedCredit {
    /// Credit amount after any phase-out at the given income.
    pub fn amount_at(
        &self,
        income: Decimal,
    ) -> Decimal {
        let Some(phase_out) = &self.phase_out else {
            return self.amount;
        };
        if income <= phase_out.start {
            return self.amount;
        }
        if income >= phase_out.end || phase_out.end == phase_out.start {
            return phase_out.minimum_amount;
        }
        let span = phase_out.end - phase_out.start;
        let reduction = (self.amount - phase_out.minimum_amount) * (income - phase_out.start) / span;
        self.amount - reduction
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederalCredits {
    pub basic_personal_amount: Option<NamedCredit>,
    pub employment_amount: Option<NamedCredit>,
    /// Rate applied to CPP + EI contributions; lowest bracket rate if unset.
    pub cpp_ei_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FederalRules {
    pub brackets: Vec<TaxBracket>,
    pub credits: FederalCredits,
    pub capital_gains_inclusion_rate: Decimal,
}

/// Second tier of a two-tier surtax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurtaxTier {
    pub threshold: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Surtax {
    pub threshold: Decimal,
    pub rate: Decimal,
    pub second_tier: Option<SurtaxTier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumBracket {
    pub threshold: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PremiumSchedule {
    /// Computed by a named formula owned by the jurisdiction's strategy.
    Formula { formula: String },
    /// Flat amount of the highest threshold the taxable income reaches.
    Brackets { brackets: Vec<PremiumBracket> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Premium {
    pub name: String,
    pub schedule: PremiumSchedule,
}

/// How a jurisdiction's provincial tax is assembled. Chosen once during
/// validation; the order of credits, surtax and premiums differs between
/// strategies, not just their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvincialStrategy {
    /// Brackets, basic credit, configured surtax, dividend credit, bracket
    /// premiums.
    Generic,
    /// Ontario: fixed 20%/36% surtax, dividend credit after surtax and the
    /// Ontario Health Premium on taxable income.
    Ontario,
}

impl ProvincialStrategy {
    pub fn for_jurisdiction(jurisdiction: Jurisdiction) -> Self {
        match jurisdiction {
            Jurisdiction::ON => Self::Ontario,
            _ => Self::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvincialRules {
    pub jurisdiction: Jurisdiction,
    pub strategy: ProvincialStrategy,
    pub brackets: Vec<TaxBracket>,
    pub basic_personal_amount: Option<NamedCredit>,
    pub surtaxes: Vec<Surtax>,
    pub premiums: Vec<Premium>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CppRules {
    pub rate: Decimal,
    pub basic_exemption: Decimal,
    pub max_pensionable_earnings: Decimal,
    pub max_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cpp2Rules {
    pub rate: Decimal,
    pub max_additional_earnings: Decimal,
    pub max_additional_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EiRules {
    pub rate: Decimal,
    pub max_insurable_earnings: Decimal,
    pub max_premium: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayrollRules {
    pub cpp: CppRules,
    pub cpp2: Option<Cpp2Rules>,
    pub ei: EiRules,
}

/// Amount a dividend credit rate is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditBase {
    Cash,
    GrossedUp,
}

impl CreditBase {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "grossed_up" => Some(Self::GrossedUp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRate {
    Flat(Decimal),
    ByJurisdiction(BTreeMap<Jurisdiction, Decimal>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DividendCredit {
    pub base: CreditBase,
    pub rate: CreditRate,
}

impl DividendCredit {
    /// Rate for `jurisdiction`. A map without an entry is an error, never
    /// an implicit zero.
    pub fn rate_for(
        &self,
        class: DividendClass,
        jurisdiction: Jurisdiction,
    ) -> Result<Decimal, TaxError> {
        match &self.rate {
            CreditRate::Flat(rate) => Ok(*rate),
            CreditRate::ByJurisdiction(rates) => rates.get(&jurisdiction).copied().ok_or(
                TaxError::MissingDividendCreditRate {
                    class,
                    jurisdiction,
                },
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DividendClassRules {
    pub gross_up_rate: Decimal,
    pub federal_credit: DividendCredit,
    pub provincial_credit: DividendCredit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DividendSchema {
    pub eligible: DividendClassRules,
    pub non_eligible: DividendClassRules,
}

impl DividendSchema {
    pub fn class(
        &self,
        class: DividendClass,
    ) -> &DividendClassRules {
        match class {
            DividendClass::Eligible => &self.eligible,
            DividendClass::NonEligible => &self.non_eligible,
        }
    }
}

/// A validated, read-only tax-year dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxYearDataset {
    year: i32,
    federal: FederalRules,
    provinces: BTreeMap<Jurisdiction, ProvincialRules>,
    payroll: PayrollRules,
    dividends: DividendSchema,
}

impl TaxYearDataset {
    /// Validates and normalizes the raw documents for `year`.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::ValidationError`] found, naming the
    /// offending field path.
    pub fn from_raw(
        year: i32,
        raw: RawDataset,
    ) -> Result<Self, crate::ValidationError> {
        validate::validate(year, raw)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn federal(&self) -> &FederalRules {
        &self.federal
    }

    pub fn provinces(&self) -> &BTreeMap<Jurisdiction, ProvincialRules> {
        &self.provinces
    }

    /// Rules for a jurisdiction given by any registered spelling.
    pub fn province(
        &self,
        key: &str,
    ) -> Result<&ProvincialRules, TaxError> {
        let jurisdiction = Jurisdiction::normalize(key)
            .ok_or_else(|| TaxError::UnknownJurisdiction(key.to_string()))?;
        self.province_rules(jurisdiction)
    }

    pub fn province_rules(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Result<&ProvincialRules, TaxError> {
        self.provinces
            .get(&jurisdiction)
            .ok_or(TaxError::JurisdictionNotConfigured(jurisdiction))
    }

    pub fn payroll(&self) -> &PayrollRules {
        &self.payroll
    }

    pub fn dividends(&self) -> &DividendSchema {
        &self.dividends
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
