//! Equated monthly installment projections shown alongside a decision.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest tenure quoted: fifty years.
pub const MAX_TENURE_MONTHS: u32 = 600;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmiError {
    #[error("principal must be a positive amount (got {0})")]
    InvalidPrincipal(f64),
    #[error("interest rate must be a non-negative percentage (got {0})")]
    InvalidRate(f64),
    #[error("tenure must be at least one month")]
    InvalidTenure,
    #[error("tenure of {0} months exceeds the {MAX_TENURE_MONTHS} month maximum")]
    TenureTooLong(u32),
    #[error("installment is outside the representable range")]
    OutOfRange,
}

/// Installment figures for a fixed-rate loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiQuote {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_months: u32,
    pub installment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

impl EmiQuote {
    pub fn new(
        principal: f64,
        annual_rate_percent: f64,
        tenure_months: u32,
    ) -> Result<Self, EmiError> {
        if !principal.is_finite() || principal <= 0.0 {
            return Err(EmiError::InvalidPrincipal(principal));
        }
        if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
            return Err(EmiError::InvalidRate(annual_rate_percent));
        }
        if tenure_months == 0 {
            return Err(EmiError::InvalidTenure);
        }
        if tenure_months > MAX_TENURE_MONTHS {
            return Err(EmiError::TenureTooLong(tenure_months));
        }

        let monthly_rate = annual_rate_percent / 12.0 / 100.0;
        let months = tenure_months as f64;
        let installment = if monthly_rate > 0.0 {
            // P·r·g / (g − 1) rewritten so an overflowing g tends to P·r
            let growth = (1.0 + monthly_rate).powf(months);
            principal * monthly_rate / (1.0 - growth.recip())
        } else {
            principal / months
        };
        let total_payment = installment * months;
        if !installment.is_finite() || !total_payment.is_finite() {
            return Err(EmiError::OutOfRange);
        }

        Ok(Self {
            principal,
            annual_rate_percent,
            tenure_months,
            installment,
            total_payment,
            total_interest: total_payment - principal,
        })
    }

    pub fn for_years(
        principal: f64,
        annual_rate_percent: f64,
        tenure_years: u32,
    ) -> Result<Self, EmiError> {
        let months = tenure_years
            .checked_mul(12)
            .ok_or(EmiError::TenureTooLong(u32::MAX))?;
        Self::new(principal, annual_rate_percent, months)
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 12.0 / 100.0
    }

    pub fn schedule(&self) -> Vec<Installment> {
        let rate = self.monthly_rate();
        let mut balance = self.principal;
        let mut rows = Vec::with_capacity(self.tenure_months as usize);

        for month in 1..=self.tenure_months {
            let interest = balance * rate;
            let mut principal = self.installment - interest;
            if month == self.tenure_months {
                // absorb floating point drift in the final row
                principal = balance;
            }
            balance = (balance - principal).max(0.0);
            rows.push(Installment {
                month,
                payment: principal + interest,
                principal,
                interest,
                balance,
            });
        }

        rows
    }

    /// Date of the last installment when the first one falls a month after `start`.
    pub fn final_payment_on(&self, start: NaiveDate) -> Option<NaiveDate> {
        start.checked_add_months(Months::new(self.tenure_months))
    }
}
