//! Unvalidated dataset documents exactly as they arrive from a source.
//!
//! These types only describe shape. Nothing in here is trusted by the
//! calculations; [`crate::TaxYearDataset::from_raw`] is the single way to
//! turn them into something the engine accepts.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four documents making up one tax year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    pub federal: RawFederal,
    pub provinces: RawProvinces,
    pub payroll: RawPayroll,
    pub dividends: RawDividends,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawBracket {
    pub threshold: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPhaseOut {
    pub start: Decimal,
    pub end: Decimal,
    pub minimum_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawNamedCredit {
    pub amount: Decimal,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub phase_out: Option<RawPhaseOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawCppEiCredit {
    #[serde(default)]
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawFederalCredits {
    #[serde(default)]
    pub basic_personal_amount: Option<RawNamedCredit>,
    #[serde(default)]
    pub employment_amount: Option<RawNamedCredit>,
    #[serde(default)]
    pub cpp_ei: Option<RawCppEiCredit>,
}

/// `federal.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawFederal {
    #[serde(default)]
    pub year: Option<i32>,
    pub brackets: Vec<RawBracket>,
    #[serde(default)]
    pub credits: RawFederalCredits,
    #[serde(default)]
    pub capital_gains_inclusion_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawProvincialCredits {
    #[serde(default)]
    pub basic_personal_amount: Option<RawNamedCredit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawSurtax {
    pub threshold: Decimal,
    pub rate: Decimal,
    #[serde(default)]
    pub threshold2: Option<Decimal>,
    #[serde(default)]
    pub rate2: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPremiumBracket {
    pub threshold: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPremium {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub brackets: Option<Vec<RawPremiumBracket>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawProvince {
    pub brackets: Vec<RawBracket>,
    #[serde(default)]
    pub credits: RawProvincialCredits,
    #[serde(default)]
    pub surtaxes: Vec<RawSurtax>,
    #[serde(default)]
    pub premiums: Vec<RawPremium>,
}

/// `provinces.json`. Keys are jurisdiction spellings, not yet normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawProvinces {
    #[serde(default)]
    pub year: Option<i32>,
    pub provinces: BTreeMap<String, RawProvince>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawCpp {
    pub rate: Decimal,
    pub basic_exemption: Decimal,
    pub max_pensionable_earnings: Decimal,
    pub max_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawCpp2 {
    pub rate: Decimal,
    pub max_additional_earnings: Decimal,
    pub max_additional_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawEi {
    pub rate: Decimal,
    pub max_insurable_earnings: Decimal,
    pub max_premium: Decimal,
}

/// `payroll.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPayroll {
    #[serde(default)]
    pub year: Option<i32>,
    pub cpp: RawCpp,
    #[serde(default)]
    pub cpp2: Option<RawCpp2>,
    pub ei: RawEi,
}

/// A credit rate is either one number or a per-jurisdiction map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCreditRate {
    Flat(Decimal),
    ByJurisdiction(BTreeMap<String, Decimal>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawDividendCredit {
    /// Kept optional here so a missing base is reported with its path
    /// instead of as a generic parse failure.
    #[serde(default)]
    pub base: Option<String>,
    pub rate: RawCreditRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawDividendCredits {
    pub federal: RawDividendCredit,
    pub provincial: RawDividendCredit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawDividendClass {
    pub gross_up_rate: Decimal,
    pub credits: RawDividendCredits,
}

/// `dividends.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawDividends {
    #[serde(default)]
    pub year: Option<i32>,
    pub eligible: RawDividendClass,
    pub non_eligible: RawDividendClass,
}
