use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{LoanId, LoanRecord, LoanRepository, LoanStatistics, RepositoryError};
use super::storage::{
    guess_content_type, sanitize_file_name, storage_path, DocumentStore, StoredDocument,
};
use crate::lending::documents::{DocumentClassifier, UploadedDocument};
use crate::lending::domain::{LoanApplication, ValidationError};
use crate::lending::eligibility::{Decision, EligibilityEvaluator};
use crate::lending::narrative::{NarrativeService, RiskStoryRequest};

/// One file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    /// Form field the file was attached to, e.g. `admission_letter`.
    #[serde(default)]
    pub field: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub content: String,
}

/// Loan request as captured by the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSubmission {
    pub applicant: String,
    pub loan_type: String,
    pub amount: i64,
    pub income: i64,
    #[serde(default)]
    pub liabilities: i64,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

/// Result of a submission: the stored record plus non-fatal side results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub record: LoanRecord,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upload_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Service composing document storage, classification, evaluation and persistence.
pub struct LoanApplicationService<R, S, N> {
    evaluator: Arc<EligibilityEvaluator>,
    classifier: Arc<DocumentClassifier>,
    repository: Arc<R>,
    storage: Arc<S>,
    narrator: Arc<N>,
    narratives_enabled: bool,
    sequence: AtomicU64,
    // Serializes the prior-loan count and the insert so concurrent submissions
    // from one applicant cannot both slip under the loan cap.
    intake: Mutex<()>,
}

impl<R, S, N> LoanApplicationService<R, S, N>
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    pub fn new(
        repository: Arc<R>,
        storage: Arc<S>,
        narrator: Arc<N>,
        evaluator: EligibilityEvaluator,
    ) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            classifier: Arc::new(DocumentClassifier::standard()),
            repository,
            storage,
            narrator,
            narratives_enabled: true,
            sequence: AtomicU64::new(1),
            intake: Mutex::new(()),
        }
    }

    fn next_loan_id(&self) -> LoanId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        LoanId(format!("loan-{id:06}"))
    }

    pub fn with_classifier(mut self, classifier: DocumentClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_narratives(mut self, enabled: bool) -> Self {
        self.narratives_enabled = enabled;
        self
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    /// Decide an already classified application without storing anything.
    pub fn preview(&self, application: &LoanApplication) -> Result<Decision, LoanServiceError> {
        Ok(self.evaluator.evaluate(application)?)
    }

    /// Store the documents, evaluate the request and persist the outcome.
    pub fn submit(
        &self,
        submission: LoanSubmission,
    ) -> Result<SubmissionReceipt, LoanServiceError> {
        let applicant = submission.applicant.trim().to_lowercase();
        if applicant.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "applicant",
                reason: "must not be blank".to_string(),
            }
            .into());
        }

        let mut application = LoanApplication {
            loan_type: submission.loan_type,
            amount: submission.amount,
            income: submission.income,
            liabilities: submission.liabilities,
            documents_provided: Default::default(),
            prior_loan_count: 0,
        };
        let figures = application.validate()?;

        let timestamp = Utc::now().timestamp();
        let mut stored_paths = Vec::new();
        let mut uploaded = Vec::new();
        let mut upload_errors = Vec::new();

        for upload in submission.documents {
            if upload.file_name.trim().is_empty() {
                continue;
            }
            let path = storage_path(&applicant, &upload.file_name, timestamp);
            let document = StoredDocument {
                content_type: guess_content_type(&upload.file_name),
                path: path.clone(),
                bytes: upload.content.into_bytes(),
            };

            match self.storage.upload(document) {
                Ok(stored) => {
                    stored_paths.push(stored);
                    uploaded.push(UploadedDocument {
                        field: upload.field,
                        file_name: sanitize_file_name(&upload.file_name),
                    });
                }
                Err(err) => {
                    warn!(%applicant, %path, error = %err, "document upload failed");
                    upload_errors.push(format!("failed to upload {}: {err}", upload.file_name));
                }
            }
        }

        application.documents_provided = self.classifier.classify(&uploaded);

        let intake_guard = self.intake.lock().map_err(|_| {
            RepositoryError::Unavailable("intake lock poisoned".to_string())
        })?;
        let prior_loans = self.repository.count_for_applicant(&applicant)?;
        application.prior_loan_count = u32::try_from(prior_loans).unwrap_or(u32::MAX);

        let decision = self.evaluator.evaluate(&application)?;

        let record = LoanRecord {
            id: self.next_loan_id(),
            applicant,
            loan_type: figures.loan_type,
            amount: figures.amount,
            income: figures.income,
            liabilities: figures.liabilities,
            decision,
            documents: stored_paths,
            created_at: Utc::now(),
        };
        let record = self.repository.insert(record)?;
        drop(intake_guard);

        info!(
            loan_id = %record.id,
            loan_type = %record.loan_type,
            status = record.status().label(),
            documents = record.documents.len(),
            "loan application recorded"
        );

        let narrative = if self.narratives_enabled {
            self.narrate(&record)
        } else {
            None
        };

        Ok(SubmissionReceipt {
            record,
            upload_errors,
            narrative,
        })
    }

    fn narrate(&self, record: &LoanRecord) -> Option<String> {
        let request = RiskStoryRequest {
            name: record.applicant.clone(),
            income: record.income,
            loan_amount: record.amount,
            purpose: record.loan_type.label().to_lowercase(),
            decision: Some(record.decision.clone()),
            ..RiskStoryRequest::default()
        };

        match self.narrator.risk_story(&request) {
            Ok(story) => Some(story),
            Err(err) => {
                warn!(loan_id = %record.id, error = %err, "risk narrative unavailable");
                None
            }
        }
    }

    pub fn get(&self, id: &LoanId) -> Result<LoanRecord, LoanServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn loans_for(&self, applicant: &str) -> Result<Vec<LoanRecord>, LoanServiceError> {
        let applicant = applicant.trim().to_lowercase();
        Ok(self.repository.for_applicant(&applicant)?)
    }

    pub fn all_loans(&self) -> Result<Vec<LoanRecord>, LoanServiceError> {
        Ok(self.repository.all()?)
    }

    pub fn statistics(&self) -> Result<LoanStatistics, LoanServiceError> {
        Ok(LoanStatistics::from_records(&self.all_loans()?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoanServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
