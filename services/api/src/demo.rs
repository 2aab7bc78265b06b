use crate::commands::describe_decision;
use crate::infra::{build_evaluator, parse_date, InMemoryDocumentStore, InMemoryLoanRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use loan_intake::config::LendingConfig;
use loan_intake::error::AppError;
use loan_intake::lending::applications::{
    DocumentUpload, LoanApplicationService, LoanSubmission, SubmissionReceipt,
};
use loan_intake::lending::narrative::format_amount;
use loan_intake::lending::{EmiQuote, NarrativeService, TemplateNarrator};
use std::sync::Arc;

const DEMO_RATE_PERCENT: f64 = 10.5;
const DEMO_TENURE_YEARS: u32 = 5;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Disbursement date used for repayment outlooks (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Skip the generated risk narratives.
    #[arg(long)]
    pub(crate) skip_narratives: bool,
}

type DemoService =
    LoanApplicationService<InMemoryLoanRepository, InMemoryDocumentStore, TemplateNarrator>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        start,
        skip_narratives,
    } = args;
    let start = start.unwrap_or_else(|| Local::now().date_naive());

    let lending = LendingConfig::default();
    let store = Arc::new(InMemoryDocumentStore::new(lending.storage_bucket.clone()));
    let service: DemoService = LoanApplicationService::new(
        Arc::new(InMemoryLoanRepository::default()),
        store.clone(),
        Arc::new(TemplateNarrator),
        build_evaluator(&lending)?,
    )
    .with_narratives(!skip_narratives);

    println!("Loan intake demo");
    println!(
        "Rule book: {} categories | max liability ratio {:.2}",
        service.evaluator().rules().len(),
        service.evaluator().config().max_liability_ratio
    );

    for submission in demo_submissions() {
        let applicant = submission.applicant.clone();
        match service.submit(submission) {
            Ok(receipt) => render_receipt(&receipt, start),
            Err(err) => println!("\n- {applicant}: submission refused ({err})"),
        }
    }

    let stats = service.statistics()?;
    println!("\nPortfolio");
    println!(
        "- {} applications | {} approved | {} rejected | {} awaiting documents",
        stats.total, stats.approved, stats.rejected, stats.needs_additional_document
    );
    for (loan_type, count) in &stats.by_type {
        println!("  - {}: {}", loan_type.label(), count);
    }
    println!(
        "- {} documents held in bucket '{}'",
        store.object_count(),
        lending.storage_bucket
    );

    Ok(())
}

fn render_receipt(receipt: &SubmissionReceipt, start: NaiveDate) {
    let record = &receipt.record;
    println!(
        "\n- {} | {} | {} ₹{}",
        record.id,
        record.applicant,
        record.loan_type.label(),
        format_amount(record.amount as f64)
    );
    println!("  Decision: {}", describe_decision(&record.decision));
    for path in &record.documents {
        println!("  Stored: {path}");
    }
    for error in &receipt.upload_errors {
        println!("  Upload issue: {error}");
    }
    if let Some(story) = &receipt.narrative {
        println!("  Risk outlook: {story}");
    }

    if !record.decision.is_approved() {
        return;
    }
    match EmiQuote::for_years(record.amount as f64, DEMO_RATE_PERCENT, DEMO_TENURE_YEARS) {
        Ok(quote) => match TemplateNarrator.repayment_story(&quote, start) {
            Ok(story) => println!("  Repayment outlook: {story}"),
            Err(err) => println!("  Repayment outlook unavailable: {err}"),
        },
        Err(err) => println!("  EMI quote unavailable: {err}"),
    }
}

fn upload(field: Option<&str>, file_name: &str) -> DocumentUpload {
    DocumentUpload {
        field: field.map(str::to_string),
        file_name: file_name.to_string(),
        content: format!("demo scan of {file_name}"),
    }
}

fn demo_submissions() -> Vec<LoanSubmission> {
    vec![
        LoanSubmission {
            applicant: "meena.k@example.in".to_string(),
            loan_type: "agriculture".to_string(),
            amount: 800_000,
            income: 32_000,
            liabilities: 6_000,
            documents: vec![upload(None, "Patta_Chitta_2024.pdf")],
        },
        LoanSubmission {
            applicant: "arjun.s@example.in".to_string(),
            loan_type: "home".to_string(),
            amount: 6_500_000,
            income: 120_000,
            liabilities: 30_000,
            documents: vec![upload(Some("property_doc"), "sale_deed.pdf")],
        },
        LoanSubmission {
            applicant: "divya.r@example.in".to_string(),
            loan_type: "education".to_string(),
            amount: 450_000,
            income: 18_000,
            liabilities: 0,
            documents: vec![upload(Some("admission_letter"), "offer_letter.pdf")],
        },
        LoanSubmission {
            applicant: "farid.b@example.in".to_string(),
            loan_type: "business".to_string(),
            amount: 3_000_000,
            income: 95_000,
            liabilities: 20_000,
            documents: vec![
                upload(Some("business_reg"), "udyam_certificate.pdf"),
                upload(None, "gst_returns_fy24.pdf"),
            ],
        },
    ]
}
