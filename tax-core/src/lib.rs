//! Canadian personal income tax engine.
//!
//! A [`TaxYearDataset`] is built from raw documents by
//! [`TaxYearDataset::from_raw`], which validates and normalizes them. The
//! engine ([`calculate`]) takes a [`PersonalTaxInput`] and a dataset and
//! returns a [`TaxResult`] with rounded totals and the full per-stage
//! breakdown.

pub mod calculations;
pub mod dataset;
mod error;
mod jurisdiction;
pub mod models;

pub use calculations::calculate;
pub use dataset::{RawDataset, TaxBracket, TaxYearDataset};
pub use error::{TaxError, ValidationError};
pub use jurisdiction::Jurisdiction;
pub use models::*;
