use chrono::NaiveDate;
use loan_intake::config::LendingConfig;
use loan_intake::error::AppError;
use loan_intake::lending::applications::{
    DocumentStore, LoanId, LoanRecord, LoanRepository, RepositoryError, StorageError,
    StoredDocument,
};
use loan_intake::lending::{EligibilityConfig, EligibilityEvaluator, RuleBook};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loans table kept in insertion order; lookups return newest first.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLoanRepository {
    records: Arc<Mutex<Vec<LoanRecord>>>,
}

impl InMemoryLoanRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Vec<LoanRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("loan table lock poisoned".to_string()))
    }
}

impl LoanRepository for InMemoryLoanRepository {
    fn insert(&self, record: LoanRecord) -> Result<LoanRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &LoanId) -> Result<Option<LoanRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn for_applicant(&self, applicant: &str) -> Result<Vec<LoanRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .iter()
            .rev()
            .filter(|record| record.applicant == applicant)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<LoanRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.iter().rev().cloned().collect())
    }
}

/// Bucket stand-in; later uploads to the same path overwrite earlier ones.
#[derive(Clone)]
pub(crate) struct InMemoryDocumentStore {
    bucket: String,
    objects: Arc<Mutex<BTreeMap<String, StoredDocument>>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::default(),
        }
    }

    pub(crate) fn object_count(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or_default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upload(&self, document: StoredDocument) -> Result<String, StorageError> {
        let key = format!("{}/{}", self.bucket, document.path);
        let mut guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("bucket lock poisoned".to_string()))?;
        guard.insert(key.clone(), document);
        Ok(key)
    }
}

/// Build the evaluator from the configured rule book, or the built-in categories.
pub(crate) fn build_evaluator(config: &LendingConfig) -> Result<EligibilityEvaluator, AppError> {
    let rules = match &config.rules_path {
        Some(path) => {
            let book = RuleBook::from_path(path)?;
            info!(path = %path.display(), categories = book.len(), "loaded custom rule book");
            book
        }
        None => RuleBook::standard(),
    };

    let thresholds = EligibilityConfig::new(config.max_liability_ratio)?;
    let evaluator = EligibilityEvaluator::new(Arc::new(rules), thresholds)?;
    Ok(evaluator)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loan_intake::lending::applications::storage::guess_content_type;
    use loan_intake::lending::{Decision, LoanType};
    use std::path::PathBuf;

    fn record(id: &str, applicant: &str) -> LoanRecord {
        LoanRecord {
            id: LoanId(id.to_string()),
            applicant: applicant.to_string(),
            loan_type: LoanType::Home,
            amount: 2_500_000,
            income: 60_000,
            liabilities: 0,
            decision: Decision::approved(),
            documents: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn repository_lists_newest_first_and_rejects_duplicates() {
        let repository = InMemoryLoanRepository::default();
        repository.insert(record("loan-1", "meera")).expect("insert");
        repository.insert(record("loan-2", "kiran")).expect("insert");
        repository.insert(record("loan-3", "meera")).expect("insert");

        let ids: Vec<_> = repository
            .for_applicant("meera")
            .expect("lookup")
            .into_iter()
            .map(|record| record.id.0)
            .collect();
        assert_eq!(ids, vec!["loan-3", "loan-1"]);
        assert_eq!(repository.count_for_applicant("kiran").expect("count"), 1);
        assert!(matches!(
            repository.insert(record("loan-2", "kiran")),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn document_store_prefixes_bucket_and_overwrites() {
        let store = InMemoryDocumentStore::new("loan-documents");
        let document = StoredDocument {
            path: "meera/deed_1.pdf".to_string(),
            content_type: guess_content_type("deed.pdf"),
            bytes: b"%PDF".to_vec(),
        };

        let key = store.upload(document.clone()).expect("upload");
        store.upload(document).expect("overwrite");

        assert_eq!(key, "loan-documents/meera/deed_1.pdf");
        assert_eq!(store.object_count(), 1);
    }

    #[test]
    fn evaluator_uses_standard_rules_without_a_path() {
        let evaluator = build_evaluator(&LendingConfig::default()).expect("evaluator");
        assert_eq!(evaluator.rules().len(), 4);
    }

    #[test]
    fn evaluator_surfaces_missing_rule_files() {
        let config = LendingConfig {
            rules_path: Some(PathBuf::from("does/not/exist/rules.json")),
            ..LendingConfig::default()
        };

        assert!(matches!(
            build_evaluator(&config),
            Err(AppError::RuleBook(_))
        ));
    }
}
