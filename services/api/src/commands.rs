use crate::infra::{build_evaluator, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use loan_intake::config::AppConfig;
use loan_intake::error::AppError;
use loan_intake::lending::batch::{self, BatchOutcome};
use loan_intake::lending::narrative::format_amount;
use loan_intake::lending::{
    Decision, DecisionStatus, DocumentClassifier, DocumentKind, EmiError, EmiQuote,
    LoanApplication, NarrativeService, TemplateNarrator, ValidationError,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Loan category: agriculture, home, education or business
    #[arg(long)]
    pub(crate) loan_type: String,
    /// Requested amount in rupees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) amount: i64,
    /// Declared monthly income in rupees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) income: i64,
    /// Existing monthly obligations in rupees
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) liabilities: i64,
    /// Loans already on file for the applicant
    #[arg(long, default_value_t = 0)]
    pub(crate) prior_loans: u32,
    /// Document tag or upload form field; repeat for several documents
    #[arg(long = "document")]
    pub(crate) documents: Vec<String>,
    /// Print the decision as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl EvaluateArgs {
    fn to_application(
        &self,
        classifier: &DocumentClassifier,
    ) -> Result<LoanApplication, ValidationError> {
        let mut application = LoanApplication {
            loan_type: self.loan_type.clone(),
            amount: self.amount,
            income: self.income,
            liabilities: self.liabilities,
            documents_provided: Default::default(),
            prior_loan_count: self.prior_loans,
        };

        for raw in &self.documents {
            let kind = raw
                .parse::<DocumentKind>()
                .or_else(|err| classifier.kind_for_field(raw).ok_or(err))?;
            application.documents_provided.insert(kind);
        }

        Ok(application)
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV with columns loan_type,amount,income,liabilities,prior_loan_count,documents
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct EmiArgs {
    /// Loan principal in rupees
    #[arg(long)]
    pub(crate) principal: f64,
    /// Annual interest rate in percent
    #[arg(long)]
    pub(crate) rate: f64,
    /// Tenure in years
    #[arg(long, required_unless_present = "tenure_months")]
    pub(crate) tenure_years: Option<u32>,
    /// Tenure in months (takes precedence over years)
    #[arg(long, conflicts_with = "tenure_years")]
    pub(crate) tenure_months: Option<u32>,
    /// Disbursement date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Print the month-by-month amortization schedule
    #[arg(long)]
    pub(crate) schedule: bool,
}

impl EmiArgs {
    fn quote(&self) -> Result<EmiQuote, EmiError> {
        match (self.tenure_months, self.tenure_years) {
            (Some(months), _) => EmiQuote::new(self.principal, self.rate, months),
            (None, Some(years)) => EmiQuote::for_years(self.principal, self.rate, years),
            (None, None) => Err(EmiError::InvalidTenure),
        }
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let evaluator = build_evaluator(&config.lending)?;
    let application = args.to_application(&DocumentClassifier::standard())?;
    let decision = evaluator.evaluate(&application)?;

    if args.json {
        match serde_json::to_string_pretty(&decision) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Decision payload unavailable: {err}"),
        }
    } else {
        println!("Loan eligibility decision");
        println!(
            "- {} for ₹{}",
            application.loan_type,
            format_amount(application.amount as f64)
        );
        println!("- {}", describe_decision(&decision));
    }

    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let evaluator = build_evaluator(&config.lending)?;
    let outcomes = batch::evaluate_path(&args.csv, &evaluator)?;

    println!("Batch evaluation of {}", args.csv.display());
    for outcome in &outcomes {
        let verdict = match &outcome.result {
            Ok(decision) => describe_decision(decision),
            Err(err) => format!("invalid input: {err}"),
        };
        println!(
            "- row {} | {} ₹{} | {}",
            outcome.row,
            outcome.loan_type,
            format_amount(outcome.amount as f64),
            verdict
        );
    }

    let tally = BatchTally::from_outcomes(&outcomes);
    println!(
        "\n{} rows: {} approved, {} rejected, {} awaiting documents, {} invalid",
        outcomes.len(),
        tally.approved,
        tally.rejected,
        tally.needs_document,
        tally.invalid
    );

    Ok(())
}

pub(crate) fn run_emi(args: EmiArgs) -> Result<(), AppError> {
    let quote = args.quote()?;
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());

    println!("EMI quote");
    println!(
        "- ₹{} at {}% for {} months",
        format_amount(quote.principal),
        quote.annual_rate_percent,
        quote.tenure_months
    );
    println!("- Monthly installment: ₹{}", format_amount(quote.installment));
    println!(
        "- Total payment: ₹{} (interest ₹{})",
        format_amount(quote.total_payment),
        format_amount(quote.total_interest)
    );

    match TemplateNarrator.repayment_story(&quote, start) {
        Ok(story) => println!("\n{story}"),
        Err(err) => println!("\nRepayment outlook unavailable: {err}"),
    }

    if args.schedule {
        println!("\nMonth | Payment | Principal | Interest | Balance");
        for row in quote.schedule() {
            println!(
                "{:>5} | {} | {} | {} | {}",
                row.month,
                format_amount(row.payment),
                format_amount(row.principal),
                format_amount(row.interest),
                format_amount(row.balance)
            );
        }
    }

    Ok(())
}

pub(crate) fn describe_decision(decision: &Decision) -> String {
    format!("{}: {}", decision.status.label(), decision.reason)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BatchTally {
    approved: usize,
    rejected: usize,
    needs_document: usize,
    invalid: usize,
}

impl BatchTally {
    fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            match &outcome.result {
                Ok(decision) => match decision.status {
                    DecisionStatus::Approved => tally.approved += 1,
                    DecisionStatus::Rejected => tally.rejected += 1,
                    DecisionStatus::NeedsAdditionalDocument => tally.needs_document += 1,
                },
                Err(_) => tally.invalid += 1,
            }
        }
        tally
    }
}
