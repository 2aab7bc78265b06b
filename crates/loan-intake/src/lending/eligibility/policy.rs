use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::config::EligibilityConfig;
use super::rules::LoanTypeRule;
use crate::lending::domain::{ApplicantFigures, DocumentKind, LoanType};

/// Outcome category reported back to the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    Rejected,
    NeedsAdditionalDocument,
}

impl DecisionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::NeedsAdditionalDocument => "needs_additional_document",
        }
    }
}

/// The first eligibility check that failed, with the figures it compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Finding {
    UnsupportedLoanType {
        loan_type: LoanType,
    },
    AmountAboveLimit {
        limit: u64,
        requested: u64,
    },
    IncomeBelowMinimum {
        minimum: u64,
        declared: u64,
    },
    LoanCountLimit {
        cap: u32,
        existing: u32,
    },
    LiabilityRatioTooHigh {
        limit: f64,
        ratio: Option<f64>,
    },
    MissingBaseDocument {
        document: DocumentKind,
    },
    MissingExtraDocument {
        document: DocumentKind,
        threshold: u64,
    },
}

impl Finding {
    pub fn status(&self) -> DecisionStatus {
        match self {
            Finding::MissingBaseDocument { .. } | Finding::MissingExtraDocument { .. } => {
                DecisionStatus::NeedsAdditionalDocument
            }
            _ => DecisionStatus::Rejected,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Finding::UnsupportedLoanType { .. } => "unsupported loan type".to_string(),
            Finding::AmountAboveLimit { .. } => "amount exceeds category limit".to_string(),
            Finding::IncomeBelowMinimum { .. } => "income below minimum".to_string(),
            Finding::LoanCountLimit { .. } => "loan count limit reached".to_string(),
            Finding::LiabilityRatioTooHigh { .. } => {
                "liabilities too high relative to income".to_string()
            }
            Finding::MissingBaseDocument { document } => {
                format!("missing required document: {document}")
            }
            Finding::MissingExtraDocument {
                document,
                threshold,
            } => format!("missing required document for amount above {threshold}: {document}"),
        }
    }
}

/// Structured eligibility result: status, deterministic reason and optional detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<Finding>,
}

pub const APPROVED_REASON: &str = "all eligibility criteria met";

impl Decision {
    pub fn approved() -> Self {
        Self {
            status: DecisionStatus::Approved,
            reason: APPROVED_REASON.to_string(),
            finding: None,
        }
    }

    pub fn from_finding(finding: Finding) -> Self {
        Self {
            status: finding.status(),
            reason: finding.summary(),
            finding: Some(finding),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }

    pub fn missing_document(&self) -> Option<DocumentKind> {
        match &self.finding {
            Some(Finding::MissingBaseDocument { document })
            | Some(Finding::MissingExtraDocument { document, .. }) => Some(*document),
            _ => None,
        }
    }
}

pub(crate) struct CheckInput<'a> {
    pub figures: &'a ApplicantFigures,
    pub documents: &'a BTreeSet<DocumentKind>,
    pub rule: &'a LoanTypeRule,
    pub config: &'a EligibilityConfig,
}

type Check = fn(&CheckInput<'_>) -> Option<Finding>;

// Order is part of the contract: only the first finding is reported.
// The liability screen relies on the income check running first, so with a
// positive `min_income` it never sees zero income.
const CHECKS: [Check; 6] = [
    amount_within_limit,
    income_meets_minimum,
    loan_count_below_cap,
    liabilities_within_ratio,
    base_document_present,
    extra_document_present,
];

pub(crate) fn decide_outcome(input: &CheckInput<'_>) -> Decision {
    CHECKS
        .iter()
        .find_map(|check| check(input))
        .map(Decision::from_finding)
        .unwrap_or_else(Decision::approved)
}

fn amount_within_limit(input: &CheckInput<'_>) -> Option<Finding> {
    (input.figures.amount > input.rule.max_amount).then(|| Finding::AmountAboveLimit {
        limit: input.rule.max_amount,
        requested: input.figures.amount,
    })
}

fn income_meets_minimum(input: &CheckInput<'_>) -> Option<Finding> {
    (input.figures.income < input.rule.min_income).then(|| Finding::IncomeBelowMinimum {
        minimum: input.rule.min_income,
        declared: input.figures.income,
    })
}

fn loan_count_below_cap(input: &CheckInput<'_>) -> Option<Finding> {
    (input.figures.prior_loan_count >= input.rule.max_active_loans).then(|| {
        Finding::LoanCountLimit {
            cap: input.rule.max_active_loans,
            existing: input.figures.prior_loan_count,
        }
    })
}

fn liabilities_within_ratio(input: &CheckInput<'_>) -> Option<Finding> {
    let limit = input.config.max_liability_ratio;
    let figures = input.figures;

    if figures.income == 0 {
        // Only reachable through a rule book with `min_income == 0`.
        return (figures.liabilities > 0)
            .then_some(Finding::LiabilityRatioTooHigh { limit, ratio: None });
    }

    let ratio = figures.liabilities as f64 / figures.income as f64;
    (ratio > limit).then_some(Finding::LiabilityRatioTooHigh {
        limit,
        ratio: Some(ratio),
    })
}

fn base_document_present(input: &CheckInput<'_>) -> Option<Finding> {
    let document = input.rule.base_required_document;
    (!input.documents.contains(&document)).then_some(Finding::MissingBaseDocument { document })
}

fn extra_document_present(input: &CheckInput<'_>) -> Option<Finding> {
    let rule = input.rule;
    (rule.requires_extra_document(input.figures.amount)
        && !rule.extra_document_satisfied(input.documents))
    .then_some(Finding::MissingExtraDocument {
        document: rule.extra_required_document,
        threshold: rule.high_amount_threshold,
    })
}
