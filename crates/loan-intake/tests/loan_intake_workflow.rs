//! Integration scenarios for loan intake through the public service facade and HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use serde_json::Value;

    use loan_intake::lending::applications::{
        DocumentStore, DocumentUpload, LoanApplicationService, LoanId, LoanRecord,
        LoanRepository, LoanSubmission, RepositoryError, StorageError, StoredDocument,
    };
    use loan_intake::lending::{EligibilityEvaluator, TemplateNarrator};

    #[derive(Default, Clone)]
    pub(super) struct Repository {
        records: Arc<Mutex<Vec<LoanRecord>>>,
    }

    impl LoanRepository for Repository {
        fn insert(&self, record: LoanRecord) -> Result<LoanRecord, RepositoryError> {
            self.records.lock().expect("lock").push(record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &LoanId) -> Result<Option<LoanRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.iter().find(|record| &record.id == id).cloned())
        }

        fn for_applicant(&self, applicant: &str) -> Result<Vec<LoanRecord>, RepositoryError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard
                .iter()
                .rev()
                .filter(|record| record.applicant == applicant)
                .cloned()
                .collect())
        }

        fn all(&self) -> Result<Vec<LoanRecord>, RepositoryError> {
            Ok(self.records.lock().expect("lock").iter().rev().cloned().collect())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct Bucket {
        objects: Arc<Mutex<Vec<StoredDocument>>>,
    }

    impl Bucket {
        pub(super) fn paths(&self) -> Vec<String> {
            self.objects
                .lock()
                .expect("lock")
                .iter()
                .map(|document| document.path.clone())
                .collect()
        }
    }

    impl DocumentStore for Bucket {
        fn upload(&self, document: StoredDocument) -> Result<String, StorageError> {
            let path = document.path.clone();
            self.objects.lock().expect("lock").push(document);
            Ok(path)
        }
    }

    pub(super) type Service = LoanApplicationService<Repository, Bucket, TemplateNarrator>;

    pub(super) fn build_service() -> (Arc<Service>, Bucket) {
        let bucket = Bucket::default();
        let service = LoanApplicationService::new(
            Arc::new(Repository::default()),
            Arc::new(bucket.clone()),
            Arc::new(TemplateNarrator),
            EligibilityEvaluator::standard(),
        );
        (Arc::new(service), bucket)
    }

    pub(super) fn upload(field: Option<&str>, file_name: &str) -> DocumentUpload {
        DocumentUpload {
            field: field.map(str::to_string),
            file_name: file_name.to_string(),
            content: "scan".to_string(),
        }
    }

    pub(super) fn home_submission(applicant: &str, amount: i64) -> LoanSubmission {
        LoanSubmission {
            applicant: applicant.to_string(),
            loan_type: "home".to_string(),
            amount,
            income: 85_000,
            liabilities: 15_000,
            documents: vec![upload(Some("property_doc"), "Sale Deed (signed).pdf")],
        }
    }

    pub(super) fn post_json(uri: &str, payload: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    pub(super) fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    pub(super) async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

mod service {
    use super::common::*;
    use loan_intake::lending::{DecisionStatus, DocumentKind, LoanType};

    #[test]
    fn home_loan_above_threshold_waits_for_income_tax_returns() {
        let (service, bucket) = build_service();

        let receipt = service
            .submit(home_submission("kavya@example.in", 6_000_000))
            .expect("submission succeeds");

        assert_eq!(
            receipt.record.decision.missing_document(),
            Some(DocumentKind::ItReturns)
        );
        let paths = bucket.paths();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("kavya_example_in/Sale Deed (signed)_"));
        assert!(paths[0].ends_with(".pdf"));
    }

    #[test]
    fn resubmission_with_returns_is_approved() {
        let (service, _) = build_service();
        service
            .submit(home_submission("kavya@example.in", 6_000_000))
            .expect("first submission");

        let mut retry = home_submission("kavya@example.in", 6_000_000);
        retry.documents.push(upload(None, "IT_Returns_FY2024.pdf"));
        let receipt = service.submit(retry).expect("second submission");

        assert_eq!(receipt.record.status(), DecisionStatus::Approved);
        assert_eq!(
            service
                .loans_for("KAVYA@example.in")
                .expect("history")
                .len(),
            2
        );
    }

    #[test]
    fn statistics_reflect_every_submission() {
        let (service, _) = build_service();
        service
            .submit(home_submission("kavya@example.in", 2_000_000))
            .expect("approved");
        service
            .submit(home_submission("rahul@example.in", 12_000_000))
            .expect("rejected");

        let stats = service.statistics().expect("stats");

        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.by_type.get(&LoanType::Home), Some(&2));
    }
}

mod routing {
    use super::common::*;
    use axum::http::StatusCode;
    use loan_intake::lending::applications::loan_router;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn submitted_loan_appears_in_applicant_history_and_stats() {
        let (service, _) = build_service();
        let router = loan_router(service);
        let payload = json!({
            "applicant": "Kavya@Example.in",
            "loan_type": "home",
            "amount": 2_000_000,
            "income": 85_000,
            "liabilities": 15_000,
            "documents": [
                { "field": "property_doc", "file_name": "deed.pdf", "content": "scan" }
            ]
        });

        let response = router
            .clone()
            .oneshot(post_json("/api/v1/loans", &payload))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let receipt = json_body(response).await;
        assert_eq!(receipt["record"]["decision"]["status"], "approved");
        assert_eq!(
            receipt["record"]["decision"]["reason"],
            "all eligibility criteria met"
        );
        let loan_id = receipt["record"]["id"].as_str().expect("id").to_string();

        let response = router
            .clone()
            .oneshot(get("/api/v1/applicants/kavya@example.in/loans"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let history = json_body(response).await;
        assert_eq!(history[0]["id"], json!(loan_id));

        let response = router
            .oneshot(get("/api/v1/loans/stats"))
            .await
            .expect("router dispatch");
        let stats = json_body(response).await;
        assert_eq!(stats["approved"], 1);
        assert_eq!(stats["by_type"]["home"], 1);
    }

    #[tokio::test]
    async fn unknown_document_tags_are_unprocessable() {
        let (service, _) = build_service();
        let payload = json!({
            "loan_type": "education",
            "amount": 100_000,
            "income": 25_000,
            "documents_provided": ["admission_letter", "selfie"]
        });

        let response = loan_router(service)
            .oneshot(post_json("/api/v1/loans/evaluate", &payload))
            .await
            .expect("router dispatch");

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn zero_rate_emi_splits_principal_evenly() {
        let (service, _) = build_service();
        let payload = json!({
            "principal": 60_000.0,
            "annual_rate_percent": 0.0,
            "tenure_months": 12
        });

        let response = loan_router(service)
            .oneshot(post_json("/api/v1/emi", &payload))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["quote"]["installment"], json!(5_000.0));
        assert_eq!(body["quote"]["total_interest"], json!(0.0));
        assert!(body.get("schedule").is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_rejected_before_the_service() {
        let (service, bucket) = build_service();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/loans")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{ not json"))
            .expect("request");

        let response = loan_router(service)
            .oneshot(request)
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(bucket.paths().is_empty());
    }
}
