use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use lending_core::config::EngineConfig;
use lending_core::risk::knockout::CreditApplication;
use lending_core::types::Money;
use lending_core::workflow::memory::InMemoryLoanRepository;
use lending_core::workflow::origination::LoanOriginator;

use crate::input;

/// Arguments for a one-shot origination
#[derive(Args)]
pub struct OriginateArgs {
    /// Path to JSON input ({"application", "existing_committed_installments"})
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct OriginationRequest {
    application: CreditApplication,
    /// Installments the customer pays to other lenders.
    #[serde(default)]
    existing_committed_installments: Money,
}

/// Run the full origination flow against a fresh in-memory book.
pub fn run_originate(
    args: OriginateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: OriginationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for origination".into());
    };

    let repository = InMemoryLoanRepository::new().with_external_commitment(
        &request.application.customer_id,
        request.existing_committed_installments,
    );
    let mut originator = LoanOriginator::new(repository, config.clone());
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let outcome = originator.originate(&request.application, today)?;
    Ok(serde_json::to_value(outcome)?)
}
