use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lending::domain::{DocumentKind, LoanType};

/// Limits and document requirements for one loan category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTypeRule {
    pub loan_type: LoanType,
    pub max_amount: u64,
    pub min_income: u64,
    pub max_active_loans: u32,
    pub base_required_document: DocumentKind,
    pub high_amount_threshold: u64,
    pub extra_required_document: DocumentKind,
    #[serde(default)]
    pub extra_document_substitutes: Vec<DocumentKind>,
}

impl LoanTypeRule {
    pub fn requires_extra_document(&self, amount: u64) -> bool {
        amount > self.high_amount_threshold
    }

    pub fn extra_document_satisfied(&self, provided: &BTreeSet<DocumentKind>) -> bool {
        provided.contains(&self.extra_required_document)
            || self
                .extra_document_substitutes
                .iter()
                .any(|kind| provided.contains(kind))
    }
}

/// Immutable table of per-category rules, built once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    rules: BTreeMap<LoanType, LoanTypeRule>,
}

#[derive(Deserialize)]
struct RuleBookFile {
    rules: Vec<LoanTypeRule>,
}

impl RuleBook {
    /// Rule table for the four products offered by the portal.
    pub fn standard() -> Self {
        let rules = standard_rules()
            .into_iter()
            .map(|rule| (rule.loan_type, rule))
            .collect();
        Self { rules }
    }

    pub fn from_rules(rules: Vec<LoanTypeRule>) -> Result<Self, RuleBookError> {
        let mut table = BTreeMap::new();
        for rule in rules {
            if rule.high_amount_threshold > rule.max_amount {
                return Err(RuleBookError::ThresholdAboveMaximum {
                    loan_type: rule.loan_type,
                    threshold: rule.high_amount_threshold,
                    max_amount: rule.max_amount,
                });
            }
            let loan_type = rule.loan_type;
            if table.insert(loan_type, rule).is_some() {
                return Err(RuleBookError::DuplicateLoanType(loan_type));
            }
        }
        Ok(Self { rules: table })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleBookError> {
        let file: RuleBookFile = serde_json::from_reader(reader)?;
        Self::from_rules(file.rules)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleBookError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn rule_for(&self, loan_type: LoanType) -> Option<&LoanTypeRule> {
        self.rules.get(&loan_type)
    }

    pub fn rules(&self) -> impl Iterator<Item = &LoanTypeRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleBookError {
    #[error("loan type '{0}' is defined more than once")]
    DuplicateLoanType(LoanType),
    #[error(
        "loan type '{loan_type}' has high amount threshold {threshold} above its maximum {max_amount}"
    )]
    ThresholdAboveMaximum {
        loan_type: LoanType,
        threshold: u64,
        max_amount: u64,
    },
    #[error("unable to read rule book: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse rule book: {0}")]
    Parse(#[from] serde_json::Error),
}

fn standard_rules() -> Vec<LoanTypeRule> {
    vec![
        LoanTypeRule {
            loan_type: LoanType::Agriculture,
            max_amount: 2_500_000,
            min_income: 15_000,
            max_active_loans: 5,
            base_required_document: DocumentKind::LandOwnership,
            high_amount_threshold: 1_000_000,
            extra_required_document: DocumentKind::CropPlan,
            extra_document_substitutes: Vec::new(),
        },
        LoanTypeRule {
            loan_type: LoanType::Home,
            max_amount: 10_000_000,
            min_income: 30_000,
            max_active_loans: 8,
            base_required_document: DocumentKind::PropertyDocument,
            high_amount_threshold: 5_000_000,
            extra_required_document: DocumentKind::ItReturns,
            extra_document_substitutes: Vec::new(),
        },
        LoanTypeRule {
            loan_type: LoanType::Education,
            max_amount: 500_000,
            min_income: 20_000,
            max_active_loans: 10,
            base_required_document: DocumentKind::AdmissionLetter,
            high_amount_threshold: 500_000,
            extra_required_document: DocumentKind::GuarantorProof,
            extra_document_substitutes: Vec::new(),
        },
        LoanTypeRule {
            loan_type: LoanType::Business,
            max_amount: 5_000_000,
            min_income: 50_000,
            max_active_loans: 12,
            base_required_document: DocumentKind::BusinessRegistration,
            high_amount_threshold: 2_000_000,
            extra_required_document: DocumentKind::GstReturns,
            extra_document_substitutes: vec![DocumentKind::ItReturns],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn standard_book_covers_every_loan_type() {
        let book = RuleBook::standard();
        assert_eq!(book.len(), 4);
        for loan_type in LoanType::ordered() {
            let rule = book.rule_for(loan_type).expect("rule defined");
            assert_eq!(rule.loan_type, loan_type);
            assert!(rule.high_amount_threshold <= rule.max_amount);
        }
    }

    #[test]
    fn duplicate_categories_are_rejected() {
        let rules = vec![standard_rules()[0].clone(), standard_rules()[0].clone()];

        match RuleBook::from_rules(rules) {
            Err(RuleBookError::DuplicateLoanType(LoanType::Agriculture)) => {}
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn threshold_must_not_exceed_maximum() {
        let mut rule = standard_rules()[1].clone();
        rule.high_amount_threshold = rule.max_amount + 1;

        assert!(matches!(
            RuleBook::from_rules(vec![rule]),
            Err(RuleBookError::ThresholdAboveMaximum {
                loan_type: LoanType::Home,
                ..
            })
        ));
    }

    #[test]
    fn loads_rules_from_json() {
        let json = r#"{
            "rules": [{
                "loan_type": "education",
                "max_amount": 750000,
                "min_income": 18000,
                "max_active_loans": 3,
                "base_required_document": "admission_letter",
                "high_amount_threshold": 400000,
                "extra_required_document": "guarantor_proof"
            }]
        }"#;

        let book = RuleBook::from_reader(Cursor::new(json)).expect("rule book parses");

        assert_eq!(book.len(), 1);
        let rule = book.rule_for(LoanType::Education).expect("education rule");
        assert_eq!(rule.high_amount_threshold, 400_000);
        assert!(rule.extra_document_substitutes.is_empty());
        assert!(book.rule_for(LoanType::Home).is_none());
    }

    #[test]
    fn business_accepts_it_returns_in_place_of_gst_returns() {
        let book = RuleBook::standard();
        let rule = book.rule_for(LoanType::Business).expect("business rule");
        let provided = BTreeSet::from([DocumentKind::ItReturns]);
        assert!(rule.extra_document_satisfied(&provided));
    }
}
