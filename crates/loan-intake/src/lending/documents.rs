//! Classification of uploaded files into document-type tags.
//!
//! The upload form has one input per document, so a recognised form field always
//! tags its file. Every file is also matched against keywords in its name, so a
//! single upload can satisfy several requirements. Keyword lists are plain
//! configuration so they can be tuned without touching the rules.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::DocumentKind;

/// Keywords up to this length must match a whole token of the file name.
const SHORT_KEYWORD_LEN: usize = 2;

/// Minimal description of an uploaded file needed for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    #[serde(default)]
    pub field: Option<String>,
    pub file_name: String,
}

impl UploadedDocument {
    pub fn new(field: Option<&str>, file_name: impl Into<String>) -> Self {
        Self {
            field: field.map(str::to_string),
            file_name: file_name.into(),
        }
    }
}

/// Form fields and filename keywords that identify one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub kind: DocumentKind,
    pub form_fields: Vec<String>,
    pub keywords: Vec<String>,
}

impl ClassifierRule {
    fn new(kind: DocumentKind, form_fields: &[&str], keywords: &[&str]) -> Self {
        Self {
            kind,
            form_fields: form_fields.iter().map(|field| field.to_string()).collect(),
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        }
    }

    fn matches_field(&self, field: &str) -> bool {
        self.form_fields
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(field))
    }

    fn matches_name(&self, lowered: &str, tokens: &[&str]) -> bool {
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.to_ascii_lowercase();
            if keyword.len() <= SHORT_KEYWORD_LEN {
                tokens.iter().any(|token| *token == keyword)
            } else {
                lowered.contains(&keyword)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentClassifier {
    rules: Vec<ClassifierRule>,
}

impl DocumentClassifier {
    pub fn standard() -> Self {
        Self::with_rules(standard_classifier_rules())
    }

    pub fn with_rules(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn kind_for_field(&self, field: &str) -> Option<DocumentKind> {
        let field = field.trim();
        self.rules
            .iter()
            .find(|rule| rule.matches_field(field))
            .map(|rule| rule.kind)
    }

    /// Tags for one document: the form field's kind when recognised, plus every
    /// kind whose keywords appear in the file name.
    pub fn classify_one(&self, document: &UploadedDocument) -> BTreeSet<DocumentKind> {
        let field_kind = document
            .field
            .as_deref()
            .and_then(|field| self.kind_for_field(field));

        let file_name = Path::new(&document.file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&document.file_name);
        let lowered = file_name.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .collect();

        self.rules
            .iter()
            .filter(|rule| rule.matches_name(&lowered, &tokens))
            .map(|rule| rule.kind)
            .chain(field_kind)
            .collect()
    }

    pub fn classify<'a, I>(&self, documents: I) -> BTreeSet<DocumentKind>
    where
        I: IntoIterator<Item = &'a UploadedDocument>,
    {
        documents
            .into_iter()
            .flat_map(|document| self.classify_one(document))
            .collect()
    }
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_classifier_rules() -> Vec<ClassifierRule> {
    vec![
        ClassifierRule::new(
            DocumentKind::LandOwnership,
            &["land_ownership"],
            &["land", "patta", "chitta", "adangal", "ownership", "property"],
        ),
        ClassifierRule::new(
            DocumentKind::CropPlan,
            &["crop_plan"],
            &["crop", "subsidy", "cultivation", "plan"],
        ),
        ClassifierRule::new(
            DocumentKind::PropertyDocument,
            &["property_doc", "property_document"],
            &["property", "house", "home", "deed", "title", "ownership"],
        ),
        ClassifierRule::new(
            DocumentKind::ItReturns,
            &["it_returns"],
            &["it", "return", "income", "tax"],
        ),
        ClassifierRule::new(
            DocumentKind::AdmissionLetter,
            &["admission_letter"],
            &["admission", "college", "university", "institute", "course"],
        ),
        ClassifierRule::new(
            DocumentKind::GuarantorProof,
            &["guarantor_proof"],
            &["guarantor", "guarantee", "sponsor"],
        ),
        ClassifierRule::new(
            DocumentKind::BusinessRegistration,
            &["business_reg", "business_registration"],
            &[
                "business",
                "registration",
                "udyam",
                "msme",
                "gst",
                "company",
                "firm",
            ],
        ),
        ClassifierRule::new(
            DocumentKind::GstReturns,
            &["gst_returns"],
            &["gst", "return", "financial", "balance", "profit"],
        ),
    ]
}
