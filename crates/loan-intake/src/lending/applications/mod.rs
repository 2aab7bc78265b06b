//! Loan application intake: document storage, classification, eligibility
//! evaluation, persistence and the HTTP surface over them.

pub mod repository;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use repository::{LoanId, LoanRecord, LoanRepository, LoanStatistics, RepositoryError};
pub use router::{loan_router, EmiRequest, EmiResponse, StoryResponse};
pub use service::{
    DocumentUpload, LoanApplicationService, LoanServiceError, LoanSubmission, SubmissionReceipt,
};
pub use storage::{DocumentStore, StorageError, StoredDocument};
