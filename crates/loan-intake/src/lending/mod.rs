pub mod applications;
pub mod batch;
pub mod documents;
pub mod domain;
pub mod eligibility;
pub mod emi;
pub mod narrative;

pub use batch::{BatchError, BatchOutcome};
pub use documents::{ClassifierRule, DocumentClassifier, UploadedDocument};
pub use domain::{ApplicantFigures, DocumentKind, LoanApplication, LoanType, ValidationError};
pub use eligibility::{
    evaluate, Decision, DecisionStatus, EligibilityConfig, EligibilityEvaluator, Finding,
    LoanTypeRule, RuleBook, RuleBookError,
};
pub use emi::{EmiError, EmiQuote, Installment};
pub use narrative::{
    NarrativeError, NarrativeService, RiskAssessment, RiskLevel, RiskStoryRequest,
    TemplateNarrator,
};
