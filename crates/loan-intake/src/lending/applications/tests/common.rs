use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::lending::applications::repository::{
    LoanId, LoanRecord, LoanRepository, RepositoryError,
};
use crate::lending::applications::storage::{DocumentStore, StorageError, StoredDocument};
use crate::lending::applications::{DocumentUpload, LoanApplicationService, LoanSubmission};
use crate::lending::eligibility::EligibilityEvaluator;
use crate::lending::emi::EmiQuote;
use crate::lending::narrative::{
    NarrativeError, NarrativeService, RiskStoryRequest, TemplateNarrator,
};

pub(super) const APPLICANT: &str = "asha.r@gmail.com";

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<LoanRecord>>>,
}

impl LoanRepository for MemoryRepository {
    fn insert(&self, record: LoanRecord) -> Result<LoanRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &LoanId) -> Result<Option<LoanRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn for_applicant(&self, applicant: &str) -> Result<Vec<LoanRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|record| record.applicant == applicant)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<LoanRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().rev().cloned().collect())
    }
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

pub(super) struct UnavailableRepository;

impl LoanRepository for UnavailableRepository {
    fn insert(&self, _record: LoanRecord) -> Result<LoanRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &LoanId) -> Result<Option<LoanRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_applicant(&self, _applicant: &str) -> Result<Vec<LoanRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<LoanRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Bucket double that refuses any file whose name contains `corrupt`.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    uploads: Arc<Mutex<Vec<StoredDocument>>>,
}

impl DocumentStore for MemoryStore {
    fn upload(&self, document: StoredDocument) -> Result<String, StorageError> {
        if document.path.contains("corrupt") {
            return Err(StorageError::Rejected("payload too large".to_string()));
        }
        let path = document.path.clone();
        self.uploads
            .lock()
            .expect("store mutex poisoned")
            .push(document);
        Ok(path)
    }
}

impl MemoryStore {
    pub(super) fn uploads(&self) -> Vec<StoredDocument> {
        self.uploads.lock().expect("store mutex poisoned").clone()
    }
}

pub(super) struct OfflineNarrator;

impl NarrativeService for OfflineNarrator {
    fn risk_story(&self, _request: &RiskStoryRequest) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable("model endpoint timed out".to_string()))
    }

    fn repayment_story(
        &self,
        _quote: &EmiQuote,
        _start: NaiveDate,
    ) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable("model endpoint timed out".to_string()))
    }
}

pub(super) type TestService =
    LoanApplicationService<MemoryRepository, MemoryStore, TemplateNarrator>;

pub(super) fn build_service() -> (TestService, MemoryRepository, MemoryStore) {
    let repository = MemoryRepository::default();
    let store = MemoryStore::default();
    let service = LoanApplicationService::new(
        Arc::new(repository.clone()),
        Arc::new(store.clone()),
        Arc::new(TemplateNarrator),
        EligibilityEvaluator::standard(),
    );
    (service, repository, store)
}

pub(super) fn upload(field: Option<&str>, file_name: &str) -> DocumentUpload {
    DocumentUpload {
        field: field.map(str::to_string),
        file_name: file_name.to_string(),
        content: "%PDF-1.7".to_string(),
    }
}

pub(super) fn education_submission() -> LoanSubmission {
    LoanSubmission {
        applicant: APPLICANT.to_string(),
        loan_type: "education".to_string(),
        amount: 450_000,
        income: 28_000,
        liabilities: 4_000,
        documents: vec![upload(Some("admission_letter"), "offer.pdf")],
    }
}

pub(super) fn agriculture_submission() -> LoanSubmission {
    LoanSubmission {
        applicant: APPLICANT.to_string(),
        loan_type: "agriculture".to_string(),
        amount: 1_200_000,
        income: 36_000,
        liabilities: 0,
        documents: vec![upload(None, "patta_chitta.pdf")],
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
