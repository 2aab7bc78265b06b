use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lending::domain::LoanType;
use crate::lending::eligibility::{Decision, DecisionStatus};

/// Identifier wrapper for persisted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(pub String);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted loan application together with the decision it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    pub applicant: String,
    pub loan_type: LoanType,
    pub amount: u64,
    pub income: u64,
    pub liabilities: u64,
    pub decision: Decision,
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl LoanRecord {
    pub fn status(&self) -> DecisionStatus {
        self.decision.status
    }
}

/// Storage abstraction over the hosted loans table.
///
/// `count_for_applicant` and `insert` are separate calls. The service serializes
/// them within one process; deployments sharing a table across processes need
/// the table itself to enforce the per-applicant loan cap.
pub trait LoanRepository: Send + Sync {
    fn insert(&self, record: LoanRecord) -> Result<LoanRecord, RepositoryError>;
    fn fetch(&self, id: &LoanId) -> Result<Option<LoanRecord>, RepositoryError>;
    /// Loans filed by one applicant, newest first.
    fn for_applicant(&self, applicant: &str) -> Result<Vec<LoanRecord>, RepositoryError>;
    /// Every loan, newest first.
    fn all(&self) -> Result<Vec<LoanRecord>, RepositoryError>;

    fn count_for_applicant(&self, applicant: &str) -> Result<usize, RepositoryError> {
        Ok(self.for_applicant(applicant)?.len())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Portfolio counts by decision status and loan type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoanStatistics {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub needs_additional_document: usize,
    pub by_type: BTreeMap<LoanType, usize>,
}

impl LoanStatistics {
    pub fn from_records(records: &[LoanRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status() {
                DecisionStatus::Approved => stats.approved += 1,
                DecisionStatus::Rejected => stats.rejected += 1,
                DecisionStatus::NeedsAdditionalDocument => stats.needs_additional_document += 1,
            }
            *stats.by_type.entry(record.loan_type).or_default() += 1;
            stats
        })
    }
}
