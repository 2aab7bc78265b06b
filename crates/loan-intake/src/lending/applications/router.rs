use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::repository::{LoanId, LoanRepository, RepositoryError};
use super::service::{LoanApplicationService, LoanServiceError, LoanSubmission};
use super::storage::DocumentStore;
use crate::lending::domain::LoanApplication;
use crate::lending::emi::{EmiError, EmiQuote, Installment};
use crate::lending::narrative::{NarrativeService, RiskAssessment, RiskLevel, RiskStoryRequest};

/// Router builder exposing intake, lookup and calculator endpoints.
pub fn loan_router<R, S, N>(service: Arc<LoanApplicationService<R, S, N>>) -> Router
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    Router::new()
        .route("/api/v1/loans", post(submit_handler::<R, S, N>))
        .route("/api/v1/loans/evaluate", post(evaluate_handler::<R, S, N>))
        .route("/api/v1/loans/stats", get(statistics_handler::<R, S, N>))
        .route("/api/v1/loans/:loan_id", get(loan_handler::<R, S, N>))
        .route(
            "/api/v1/applicants/:applicant/loans",
            get(applicant_loans_handler::<R, S, N>),
        )
        .route("/api/v1/emi", post(emi_handler))
        .route("/api/v1/stories/risk", post(risk_story_handler::<R, S, N>))
        .route(
            "/api/v1/stories/repayment",
            post(repayment_story_handler::<R, S, N>),
        )
        .with_state(service)
}

/// Calculator request shared by the EMI and repayment story endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct EmiRequest {
    pub principal: f64,
    pub annual_rate_percent: f64,
    #[serde(default)]
    pub tenure_months: Option<u32>,
    #[serde(default)]
    pub tenure_years: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub include_schedule: bool,
}

impl EmiRequest {
    fn quote(&self) -> Result<EmiQuote, EmiError> {
        match (self.tenure_months, self.tenure_years) {
            (Some(months), _) => EmiQuote::new(self.principal, self.annual_rate_percent, months),
            (None, Some(years)) => {
                EmiQuote::for_years(self.principal, self.annual_rate_percent, years)
            }
            (None, None) => Err(EmiError::InvalidTenure),
        }
    }

    fn start_date(&self) -> NaiveDate {
        self.start_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Debug, Serialize)]
pub struct EmiResponse {
    pub quote: EmiQuote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_payment_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<Installment>>,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub story: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

fn service_error_response(error: LoanServiceError) -> Response {
    match error {
        LoanServiceError::Validation(err) => {
            let payload = json!({
                "error": err.to_string(),
                "field": err.field(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        LoanServiceError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "loan application not found")
        }
        LoanServiceError::Repository(RepositoryError::Conflict) => {
            error_response(StatusCode::CONFLICT, "loan application already exists")
        }
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn submit_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Json(submission): Json<LoanSubmission>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    match service.submit(submission) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Json(application): Json<LoanApplication>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    match service.preview(&application) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn loan_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Path(loan_id): Path<String>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    match service.get(&LoanId(loan_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn applicant_loans_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Path(applicant): Path<String>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    match service.loans_for(&applicant) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn statistics_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    match service.statistics() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn emi_handler(Json(request): Json<EmiRequest>) -> Response {
    let quote = match request.quote() {
        Ok(quote) => quote,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };

    let final_payment_on = quote.final_payment_on(request.start_date());
    let schedule = request.include_schedule.then(|| quote.schedule());

    let response = EmiResponse {
        quote,
        final_payment_on,
        schedule,
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub(crate) async fn risk_story_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Json(request): Json<RiskStoryRequest>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    let level = RiskAssessment::from_request(&request).level;
    match service.narrator().risk_story(&request) {
        Ok(story) => {
            let response = StoryResponse {
                story,
                risk_level: Some(level),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

pub(crate) async fn repayment_story_handler<R, S, N>(
    State(service): State<Arc<LoanApplicationService<R, S, N>>>,
    Json(request): Json<EmiRequest>,
) -> Response
where
    R: LoanRepository + 'static,
    S: DocumentStore + 'static,
    N: NarrativeService + 'static,
{
    let quote = match request.quote() {
        Ok(quote) => quote,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };

    match service
        .narrator()
        .repayment_story(&quote, request.start_date())
    {
        Ok(story) => {
            let response = StoryResponse {
                story,
                risk_level: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(StatusCode::BAD_GATEWAY, err.to_string()),
    }
}
