use rust_decimal::Decimal;
use thiserror::Error;

use crate::Jurisdiction;
use crate::models::DividendClass;

/// A dataset document failed shape or bounds validation.
///
/// Every variant names the offending field with a dotted path such as
/// `provinces.ON.brackets[2].rate`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: bracket list must not be empty")]
    EmptyBrackets { path: String },

    #[error("{path}: threshold {threshold} is lower than the previous threshold {previous}")]
    ThresholdsNotAscending {
        path: String,
        threshold: Decimal,
        previous: Decimal,
    },

    #[error("{path}: rate must be between 0 and 1, got {value}")]
    RateOutOfBounds { path: String, value: Decimal },

    #[error("{path}: amount must be non-negative, got {value}")]
    NegativeAmount { path: String, value: Decimal },

    #[error("{path}: unrecognized jurisdiction '{key}'")]
    UnknownJurisdiction { path: String, key: String },

    #[error("{path}: '{key}' and another entry both resolve to {code}")]
    DuplicateJurisdiction {
        path: String,
        key: String,
        code: Jurisdiction,
    },

    #[error("{path}: at least {required} jurisdictions are required, found {found}")]
    TooFewJurisdictions {
        path: String,
        found: usize,
        required: usize,
    },

    #[error("{path}: second surtax tier needs both threshold2 and rate2")]
    IncompleteSurtaxTier { path: String },

    #[error("{path}: threshold2 {threshold2} is below threshold {threshold}")]
    SurtaxTierOrder {
        path: String,
        threshold: Decimal,
        threshold2: Decimal,
    },

    #[error("{path}: {jurisdiction} requires a two-tier surtax")]
    MissingSurtaxTiers {
        path: String,
        jurisdiction: Jurisdiction,
    },

    #[error("{path}: premium must declare exactly one of 'formula' or 'brackets'")]
    AmbiguousPremium { path: String },

    #[error("{path}: {jurisdiction} has no premium formula '{formula}'; use brackets")]
    UnsupportedPremiumFormula {
        path: String,
        jurisdiction: Jurisdiction,
        formula: String,
    },

    #[error("{path}: credit base is required")]
    MissingCreditBase { path: String },

    #[error("{path}: credit base must be 'cash' or 'grossed_up', got '{value}'")]
    InvalidCreditBase { path: String, value: String },

    #[error("{path}: federal credit rate must be a single number")]
    FederalRateNotFlat { path: String },

    #[error("{path}: rate map must include the reference jurisdiction {code}")]
    MissingReferenceJurisdiction { path: String, code: Jurisdiction },

    #[error("{path}: gross-up rate must be greater than 1, got {value}")]
    GrossUpRate { path: String, value: Decimal },

    #[error("{path}: phase-out start {start} is after end {end}")]
    PhaseOutRange {
        path: String,
        start: Decimal,
        end: Decimal,
    },

    #[error("{path}: minimum amount {minimum} exceeds amount {amount}")]
    PhaseOutMinimum {
        path: String,
        minimum: Decimal,
        amount: Decimal,
    },

    #[error("{path}: basic exemption {exemption} exceeds maximum pensionable earnings {maximum}")]
    ExemptionAboveMaximum {
        path: String,
        exemption: Decimal,
        maximum: Decimal,
    },

    #[error("{path}: document is for tax year {found}, expected {expected}")]
    YearMismatch {
        path: String,
        expected: i32,
        found: i32,
    },
}

impl ValidationError {
    /// Dotted path of the offending field.
    pub fn path(&self) -> &str {
        match self {
            Self::EmptyBrackets { path }
            | Self::ThresholdsNotAscending { path, .. }
            | Self::RateOutOfBounds { path, .. }
            | Self::NegativeAmount { path, .. }
            | Self::UnknownJurisdiction { path, .. }
            | Self::DuplicateJurisdiction { path, .. }
            | Self::TooFewJurisdictions { path, .. }
            | Self::IncompleteSurtaxTier { path }
            | Self::SurtaxTierOrder { path, .. }
            | Self::MissingSurtaxTiers { path, .. }
            | Self::AmbiguousPremium { path }
            | Self::MissingCreditBase { path }
            | Self::InvalidCreditBase { path, .. }
            | Self::FederalRateNotFlat { path }
            | Self::MissingReferenceJurisdiction { path, .. }
            | Self::GrossUpRate { path, .. }
            | Self::PhaseOutRange { path, .. }
            | Self::PhaseOutMinimum { path, .. }
            | Self::UnsupportedPremiumFormula { path, .. }
            | Self::ExemptionAboveMaximum { path, .. }
            | Self::YearMismatch { path, .. } => path,
        }
    }
}

/// Errors surfaced by the computation engine and the dataset accessors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error("no dataset loaded for tax year {year}")]
    DatasetNotLoaded { year: i32 },

    #[error("unrecognized jurisdiction '{0}'")]
    UnknownJurisdiction(String),

    #[error("jurisdiction {0} is not configured in the loaded dataset")]
    JurisdictionNotConfigured(Jurisdiction),

    #[error("{class} dividend credit has no provincial rate for {jurisdiction}")]
    MissingDividendCreditRate {
        class: DividendClass,
        jurisdiction: Jurisdiction,
    },

    #[error("input is for tax year {input}, dataset is for {dataset}")]
    YearMismatch { input: i32, dataset: i32 },

    #[error("{field} of {value} is outside the supported range of ±{limit}")]
    AmountOutOfRange {
        field: String,
        value: Decimal,
        limit: Decimal,
    },
}
