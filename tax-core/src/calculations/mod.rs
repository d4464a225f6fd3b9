//! Tax calculation stages and the engine that composes them.
//!
//! Every stage is a pure function over validated dataset rules. The engine
//! in [`engine`] runs them in order; the individual stages stay public so
//! callers can reproduce one part of a result in isolation.

pub mod brackets;
pub mod common;
pub mod dividends;
pub mod engine;
pub mod federal;
pub mod marginal;
pub mod payroll;
pub mod provincial;

pub use brackets::tax_brackets;
pub use dividends::{credit_amount, dividend_breakdown, dividend_detail};
pub use engine::{MAX_INPUT_AMOUNT, calculate};
pub use federal::{FederalStageInput, federal_tax};
pub use marginal::{PERTURBATION, marginal_rates};
pub use payroll::payroll_levies;
pub use provincial::{ProvincialStageInput, ontario_health_premium, provincial_tax};
