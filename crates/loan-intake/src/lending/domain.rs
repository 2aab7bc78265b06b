use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Loan products offered through the intake portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Agriculture,
    Home,
    Education,
    Business,
}

impl LoanType {
    pub const fn ordered() -> [Self; 4] {
        [Self::Agriculture, Self::Home, Self::Education, Self::Business]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Agriculture => "agriculture",
            Self::Home => "home",
            Self::Education => "education",
            Self::Business => "business",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Agriculture => "Agriculture Loan",
            Self::Home => "Home Loan",
            Self::Education => "Education Loan",
            Self::Business => "Business Loan",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LoanType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|loan_type| loan_type.key() == normalized)
            .ok_or_else(|| ValidationError::UnknownLoanType(value.trim().to_string()))
    }
}

/// Document-type tags the eligibility rules reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    LandOwnership,
    CropPlan,
    PropertyDocument,
    ItReturns,
    AdmissionLetter,
    GuarantorProof,
    BusinessRegistration,
    GstReturns,
}

impl DocumentKind {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::LandOwnership,
            Self::CropPlan,
            Self::PropertyDocument,
            Self::ItReturns,
            Self::AdmissionLetter,
            Self::GuarantorProof,
            Self::BusinessRegistration,
            Self::GstReturns,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::LandOwnership => "land_ownership",
            Self::CropPlan => "crop_plan",
            Self::PropertyDocument => "property_document",
            Self::ItReturns => "it_returns",
            Self::AdmissionLetter => "admission_letter",
            Self::GuarantorProof => "guarantor_proof",
            Self::BusinessRegistration => "business_registration",
            Self::GstReturns => "gst_returns",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LandOwnership => "land ownership document (Patta/Chitta/Adangal)",
            Self::CropPlan => "crop plan or subsidy proof",
            Self::PropertyDocument => "property document",
            Self::ItReturns => "IT returns",
            Self::AdmissionLetter => "admission letter",
            Self::GuarantorProof => "guarantor proof",
            Self::BusinessRegistration => "business registration proof (Udyam/MSME/GST)",
            Self::GstReturns => "GST returns",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DocumentKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.key() == normalized)
            .ok_or_else(|| ValidationError::UnknownDocument(value.trim().to_string()))
    }
}

/// Structured input for a single eligibility evaluation.
///
/// Numeric fields are signed so malformed submissions can be reported instead of
/// silently wrapping; `validate` turns them into an [`ApplicantFigures`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub loan_type: String,
    pub amount: i64,
    pub income: i64,
    #[serde(default)]
    pub liabilities: i64,
    #[serde(default)]
    pub documents_provided: BTreeSet<DocumentKind>,
    #[serde(default)]
    pub prior_loan_count: u32,
}

impl LoanApplication {
    pub fn new(loan_type: LoanType, amount: i64, income: i64) -> Self {
        Self {
            loan_type: loan_type.key().to_string(),
            amount,
            income,
            liabilities: 0,
            documents_provided: BTreeSet::new(),
            prior_loan_count: 0,
        }
    }

    pub fn with_liabilities(mut self, liabilities: i64) -> Self {
        self.liabilities = liabilities;
        self
    }

    pub fn with_prior_loans(mut self, prior_loan_count: u32) -> Self {
        self.prior_loan_count = prior_loan_count;
        self
    }

    pub fn with_document(mut self, kind: DocumentKind) -> Self {
        self.documents_provided.insert(kind);
        self
    }

    /// Check field domains and return the parsed loan type with unsigned figures.
    pub fn validate(&self) -> Result<ApplicantFigures, ValidationError> {
        let loan_type = self.loan_type.parse::<LoanType>()?;
        Ok(ApplicantFigures {
            loan_type,
            amount: non_negative("amount", self.amount)?,
            income: non_negative("income", self.income)?,
            liabilities: non_negative("liabilities", self.liabilities)?,
            prior_loan_count: self.prior_loan_count,
        })
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::Negative { field, value })
}

/// Validated numeric view over a [`LoanApplication`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicantFigures {
    pub loan_type: LoanType,
    pub amount: u64,
    pub income: u64,
    pub liabilities: u64,
    pub prior_loan_count: u32,
}

/// Malformed or out-of-domain input. Never produced for business rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("loan_type: unknown loan type '{0}'")]
    UnknownLoanType(String),
    #[error("documents_provided: unknown document type '{0}'")]
    UnknownDocument(String),
    #[error("{field}: must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::UnknownLoanType(_) => "loan_type",
            ValidationError::UnknownDocument(_) => "documents_provided",
            ValidationError::Negative { field, .. } => field,
            ValidationError::InvalidField { field, .. } => field,
        }
    }
}
