mod config;
mod policy;
mod rules;

pub use config::{EligibilityConfig, DEFAULT_MAX_LIABILITY_RATIO};
pub use policy::{Decision, DecisionStatus, Finding, APPROVED_REASON};
pub use rules::{LoanTypeRule, RuleBook, RuleBookError};

use std::sync::Arc;

use super::domain::{LoanApplication, ValidationError};
use policy::{decide_outcome, CheckInput};
use tracing::debug;

/// Stateless evaluator applying the shared rule book to loan applications.
///
/// Cloning is cheap; the rule book is shared behind an `Arc` so request
/// handlers on any thread can evaluate concurrently.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    rules: Arc<RuleBook>,
    config: EligibilityConfig,
}

impl EligibilityEvaluator {
    pub fn new(rules: Arc<RuleBook>, config: EligibilityConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { rules, config })
    }

    pub fn standard() -> Self {
        Self {
            rules: Arc::new(RuleBook::standard()),
            config: EligibilityConfig::default(),
        }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Evaluate an application against the rule registered for its loan type.
    pub fn evaluate(&self, application: &LoanApplication) -> Result<Decision, ValidationError> {
        let figures = application.validate()?;
        let rule = self.rules.rule_for(figures.loan_type);
        evaluate(application, rule, &self.config)
    }
}

/// Evaluate one application against an already resolved rule.
///
/// A `None` rule means the category is not offered and yields a rejection;
/// a rule for a different category is a caller error.
pub fn evaluate(
    application: &LoanApplication,
    rule: Option<&LoanTypeRule>,
    config: &EligibilityConfig,
) -> Result<Decision, ValidationError> {
    config.validate()?;
    let figures = application.validate()?;

    let decision = match rule {
        None => Decision::from_finding(Finding::UnsupportedLoanType {
            loan_type: figures.loan_type,
        }),
        Some(rule) if rule.loan_type != figures.loan_type => {
            return Err(ValidationError::InvalidField {
                field: "loan_type",
                reason: format!(
                    "rule for '{}' cannot evaluate a '{}' application",
                    rule.loan_type, figures.loan_type
                ),
            });
        }
        Some(rule) => decide_outcome(&CheckInput {
            figures: &figures,
            documents: &application.documents_provided,
            rule,
            config,
        }),
    };

    debug!(
        loan_type = %figures.loan_type,
        amount = figures.amount,
        status = decision.status.label(),
        reason = %decision.reason,
        "eligibility evaluated"
    );

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::domain::{DocumentKind, LoanType};

    fn education(amount: i64) -> LoanApplication {
        LoanApplication::new(LoanType::Education, amount, 20_000)
            .with_document(DocumentKind::AdmissionLetter)
    }

    #[test]
    fn education_example_is_approved_at_the_ceiling() {
        let decision = EligibilityEvaluator::standard()
            .evaluate(&education(500_000))
            .expect("valid input");

        assert_eq!(decision.status, DecisionStatus::Approved);
        assert_eq!(decision.reason, APPROVED_REASON);
    }

    #[test]
    fn education_example_above_ceiling_is_rejected() {
        let decision = EligibilityEvaluator::standard()
            .evaluate(&education(600_000))
            .expect("valid input");

        assert_eq!(decision.status, DecisionStatus::Rejected);
        assert_eq!(decision.reason, "amount exceeds category limit");
    }

    #[test]
    fn lower_education_threshold_requires_guarantor_proof() {
        let mut rule = RuleBook::standard()
            .rule_for(LoanType::Education)
            .cloned()
            .expect("education rule");
        rule.high_amount_threshold = 400_000;
        let book = RuleBook::from_rules(vec![rule]).expect("valid rule book");
        let evaluator =
            EligibilityEvaluator::new(Arc::new(book), EligibilityConfig::default())
                .expect("config");

        let decision = evaluator.evaluate(&education(500_000)).expect("valid input");

        assert_eq!(decision.status, DecisionStatus::NeedsAdditionalDocument);
        assert_eq!(decision.missing_document(), Some(DocumentKind::GuarantorProof));
    }

    #[test]
    fn category_missing_from_book_is_unsupported() {
        let book = RuleBook::from_rules(Vec::new()).expect("empty book");
        let evaluator =
            EligibilityEvaluator::new(Arc::new(book), EligibilityConfig::default())
                .expect("config");

        let decision = evaluator.evaluate(&education(100_000)).expect("valid input");

        assert_eq!(decision.status, DecisionStatus::Rejected);
        assert_eq!(decision.reason, "unsupported loan type");
    }

    #[test]
    fn unknown_loan_type_is_a_validation_error() {
        let mut application = education(100_000);
        application.loan_type = "vehicle".to_string();

        let err = EligibilityEvaluator::standard()
            .evaluate(&application)
            .expect_err("unknown type");
        assert_eq!(err.field(), "loan_type");
    }

    #[test]
    fn mismatched_rule_is_a_validation_error() {
        let book = RuleBook::standard();
        let err = evaluate(
            &education(100_000),
            book.rule_for(LoanType::Home),
            &EligibilityConfig::default(),
        )
        .expect_err("mismatched rule");
        assert_eq!(err.field(), "loan_type");
    }

    #[test]
    fn invalid_ratio_is_rejected_at_construction() {
        let config = EligibilityConfig {
            max_liability_ratio: f64::NAN,
        };
        let err = EligibilityEvaluator::new(Arc::new(RuleBook::standard()), config)
            .expect_err("nan ratio");
        assert_eq!(err.field(), "max_liability_ratio");
    }

    #[test]
    fn zero_income_rule_screens_liabilities_without_dividing() {
        let mut rule = RuleBook::standard()
            .rule_for(LoanType::Education)
            .cloned()
            .expect("education rule");
        rule.min_income = 0;
        let config = EligibilityConfig::default();

        let burdened = LoanApplication::new(LoanType::Education, 100_000, 0)
            .with_liabilities(1)
            .with_document(DocumentKind::AdmissionLetter);
        let clean = LoanApplication::new(LoanType::Education, 100_000, 0)
            .with_document(DocumentKind::AdmissionLetter);

        let decision = evaluate(&burdened, Some(&rule), &config).expect("valid input");
        assert_eq!(
            decision.finding,
            Some(Finding::LiabilityRatioTooHigh {
                limit: DEFAULT_MAX_LIABILITY_RATIO,
                ratio: None,
            })
        );
        assert!(evaluate(&clean, Some(&rule), &config)
            .expect("valid input")
            .is_approved());
    }
}
