use serde::{Deserialize, Serialize};

use crate::lending::domain::ValidationError;

pub const DEFAULT_MAX_LIABILITY_RATIO: f64 = 0.5;

/// Thresholds shared by every loan category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Largest accepted `liabilities / income` ratio (inclusive).
    pub max_liability_ratio: f64,
}

impl EligibilityConfig {
    pub fn new(max_liability_ratio: f64) -> Result<Self, ValidationError> {
        let config = Self {
            max_liability_ratio,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.max_liability_ratio.is_finite() || self.max_liability_ratio < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "max_liability_ratio",
                reason: format!(
                    "must be a finite, non-negative ratio (got {})",
                    self.max_liability_ratio
                ),
            });
        }
        Ok(())
    }
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            max_liability_ratio: DEFAULT_MAX_LIABILITY_RATIO,
        }
    }
}
