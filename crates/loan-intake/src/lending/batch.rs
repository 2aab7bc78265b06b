use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{DocumentKind, LoanApplication, ValidationError};
use super::eligibility::{Decision, EligibilityEvaluator};

/// Separator between document tags inside the `documents` column.
pub const DOCUMENT_SEPARATOR: char = ';';

#[derive(Debug)]
pub enum BatchError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Io(err) => write!(f, "failed to read application batch: {}", err),
            BatchError::Csv(err) => write!(f, "invalid application CSV data: {}", err),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Io(err) => Some(err),
            BatchError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Decision for one data row. Malformed rows keep their validation error so
/// the rest of the batch is still evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// 1-based data row, excluding the header.
    pub row: usize,
    pub loan_type: String,
    pub amount: i64,
    pub result: Result<Decision, ValidationError>,
}

impl BatchOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(&self.result, Ok(decision) if decision.is_approved())
    }
}

pub fn evaluate_path<P: AsRef<Path>>(
    path: P,
    evaluator: &EligibilityEvaluator,
) -> Result<Vec<BatchOutcome>, BatchError> {
    let file = std::fs::File::open(path)?;
    evaluate_reader(file, evaluator)
}

/// Evaluate every row of a CSV with the columns
/// `loan_type,amount,income,liabilities,prior_loan_count,documents`.
pub fn evaluate_reader<R: Read>(
    reader: R,
    evaluator: &EligibilityEvaluator,
) -> Result<Vec<BatchOutcome>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut outcomes = Vec::new();

    for (index, record) in csv_reader.deserialize::<BatchRow>().enumerate() {
        let row = record?;
        let loan_type = row.loan_type.clone();
        let amount = row.amount;
        let result = row
            .into_application()
            .and_then(|application| evaluator.evaluate(&application));

        outcomes.push(BatchOutcome {
            row: index + 1,
            loan_type,
            amount,
            result,
        });
    }

    Ok(outcomes)
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    loan_type: String,
    amount: i64,
    income: i64,
    #[serde(default)]
    liabilities: Option<i64>,
    #[serde(default)]
    prior_loan_count: Option<u32>,
    #[serde(default)]
    documents: Option<String>,
}

impl BatchRow {
    fn into_application(self) -> Result<LoanApplication, ValidationError> {
        let documents_provided = parse_documents(self.documents.as_deref().unwrap_or_default())?;

        Ok(LoanApplication {
            loan_type: self.loan_type,
            amount: self.amount,
            income: self.income,
            liabilities: self.liabilities.unwrap_or_default(),
            documents_provided,
            prior_loan_count: self.prior_loan_count.unwrap_or_default(),
        })
    }
}

fn parse_documents(raw: &str) -> Result<BTreeSet<DocumentKind>, ValidationError> {
    raw.split(DOCUMENT_SEPARATOR)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::parse)
        .collect()
}
