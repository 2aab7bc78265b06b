//! Applicant-facing narratives generated after a decision is made.
//!
//! Production deployments plug a text-generation service in behind
//! [`NarrativeService`]; [`TemplateNarrator`] is the deterministic fallback used
//! by the bundled server, the demo and the tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::eligibility::{Decision, DecisionStatus};
use super::emi::EmiQuote;

const HIGH_EXPENSE_SHARE: f64 = 0.6;
const LARGE_LOAN_INCOME_MULTIPLE: u64 = 20;
const UNSTABLE_JOB_TYPES: [&str; 3] = ["contract", "temporary", "seasonal"];

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),
    #[error("narrative request rejected: {0}")]
    InvalidRequest(String),
}

/// External collaborator that turns decisions and projections into prose.
pub trait NarrativeService: Send + Sync {
    fn risk_story(&self, request: &RiskStoryRequest) -> Result<String, NarrativeError>;
    fn repayment_story(&self, quote: &EmiQuote, start: NaiveDate)
        -> Result<String, NarrativeError>;
}

/// Applicant context for a risk narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStoryRequest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub income: u64,
    #[serde(default)]
    pub expenses: u64,
    #[serde(default)]
    pub loan_amount: u64,
    #[serde(default = "default_emi_day")]
    pub emi_day: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_purpose")]
    pub purpose: String,
    #[serde(default)]
    pub decision: Option<Decision>,
}

fn default_name() -> String {
    "Customer".to_string()
}

fn default_emi_day() -> String {
    "1".to_string()
}

fn default_job_type() -> String {
    "Unknown".to_string()
}

fn default_location() -> String {
    "your area".to_string()
}

fn default_purpose() -> String {
    "personal needs".to_string()
}

impl Default for RiskStoryRequest {
    fn default() -> Self {
        Self {
            name: default_name(),
            income: 0,
            expenses: 0,
            loan_amount: 0,
            emi_day: default_emi_day(),
            job_type: default_job_type(),
            location: default_location(),
            purpose: default_purpose(),
            decision: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    fn from_burden_ratio(ratio: f64) -> Self {
        if ratio < 0.3 {
            RiskLevel::Low
        } else if ratio < 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Heuristic affordability reading used to phrase the risk story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub disposable_income: u64,
    pub burden_ratio: f64,
    pub factors: Vec<&'static str>,
}

impl RiskAssessment {
    pub fn from_request(request: &RiskStoryRequest) -> Self {
        let disposable_income = request.income.saturating_sub(request.expenses);
        let monthly_burden = request.loan_amount as f64 / 12.0;
        let burden_ratio = if disposable_income > 0 {
            monthly_burden / disposable_income as f64
        } else {
            1.0
        };

        let mut factors = Vec::new();
        if request.expenses as f64 > request.income as f64 * HIGH_EXPENSE_SHARE {
            factors.push("high monthly expenses");
        }
        if request.loan_amount > request.income.saturating_mul(LARGE_LOAN_INCOME_MULTIPLE) {
            factors.push("loan amount is large relative to income");
        }
        let job_type = request.job_type.to_lowercase();
        if UNSTABLE_JOB_TYPES.contains(&job_type.as_str()) {
            factors.push("income stability");
        }

        Self {
            level: RiskLevel::from_burden_ratio(burden_ratio),
            disposable_income,
            burden_ratio,
            factors,
        }
    }
}

/// Deterministic narrator built from fixed sentence templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrativeService for TemplateNarrator {
    fn risk_story(&self, request: &RiskStoryRequest) -> Result<String, NarrativeError> {
        let assessment = RiskAssessment::from_request(request);
        let factors = if assessment.factors.is_empty() {
            "current income and expense pattern".to_string()
        } else {
            assessment.factors.join(", ")
        };

        let mut story = format!(
            "Hi {name}, based on your profile in {location} and a requested loan of ₹{amount} for {purpose}, \
             your risk level looks {level}. Key factors are {factors}. ",
            name = request.name.trim(),
            location = request.location,
            amount = group_thousands(request.loan_amount),
            purpose = request.purpose,
            level = assessment.level.label(),
        );

        if let Some(decision) = &request.decision {
            story.push_str(&decision_sentence(decision));
        }

        story.push_str(&format!(
            "Consider festival and seasonal expenses in {location}. \
             Your EMI due around date {emi_day} may clash with monthly bills. \
             With income of ₹{income} and expenses of ₹{expenses}, your monthly buffer is about ₹{buffer}. \
             Try keeping 2–3 months EMI buffer and reduce discretionary spends.",
            location = request.location,
            emi_day = request.emi_day,
            income = group_thousands(request.income),
            expenses = group_thousands(request.expenses),
            buffer = group_thousands(assessment.disposable_income),
        ));

        Ok(story)
    }

    fn repayment_story(
        &self,
        quote: &EmiQuote,
        start: NaiveDate,
    ) -> Result<String, NarrativeError> {
        let final_payment = quote.final_payment_on(start).ok_or_else(|| {
            NarrativeError::InvalidRequest("final payment date is out of range".to_string())
        })?;

        Ok(format!(
            "For a loan of ₹{principal} with a tenure of {months} months at {rate}% interest, \
             your estimated monthly payment (EMI) will be approximately ₹{emi}. \
             Over the entire loan period, you will pay a total of ₹{total}, \
             which includes ₹{interest} in interest. \
             Your payments will continue for {months} months, with your final payment expected around {month}. \
             This helps you plan your finances for the long term.",
            principal = format_amount(quote.principal),
            months = quote.tenure_months,
            rate = quote.annual_rate_percent,
            emi = format_amount(quote.installment),
            total = format_amount(quote.total_payment),
            interest = format_amount(quote.total_interest),
            month = final_payment.format("%B %Y"),
        ))
    }
}

fn decision_sentence(decision: &Decision) -> String {
    match decision.status {
        DecisionStatus::Approved => "Your application met every eligibility check. ".to_string(),
        DecisionStatus::Rejected => {
            format!("Your application was not approved: {}. ", decision.reason)
        }
        DecisionStatus::NeedsAdditionalDocument => {
            format!("We still need one more document: {}. ", decision.reason)
        }
    }
}

/// Render an integer with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Render a currency amount with two decimals and thousands separators.
pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{}.{:02}", group_thousands(cents / 100), cents % 100)
}
