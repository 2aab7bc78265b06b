//! Loan application intake and eligibility decisions.

pub mod config;
pub mod error;
pub mod lending;
pub mod telemetry;
