use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use lending_core::amortization::installment::{self, LoanInput};
use lending_core::amortization::schedule::{self, ScheduleInput};
use lending_core::config::EngineConfig;
use lending_core::validation::validate_with_limits;
use lending_core::wire::{self, SimulationRequest};

use crate::input;

/// Arguments for the installment calculation
#[derive(Args)]
pub struct InstallmentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a percentage (18 = 18%)
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,
}

/// Arguments for the amortization table
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a percentage (18 = 18%)
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Disbursement date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

/// Arguments for parameter validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Loan principal
    #[arg(long, allow_hyphen_values = true)]
    pub principal: Decimal,

    /// Annual rate as a percentage
    #[arg(long, alias = "rate", allow_hyphen_values = true)]
    pub annual_rate_percent: Decimal,

    /// Term in months
    #[arg(long, alias = "term", allow_hyphen_values = true)]
    pub term_months: i64,
}

/// Arguments for a web-client simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON request ({"monto", "tasaInteres", "plazoMeses"})
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub monto: Option<Decimal>,

    #[arg(long)]
    pub tasa_interes: Option<Decimal>,

    #[arg(long, allow_hyphen_values = true)]
    pub plazo_meses: Option<i64>,
}

pub fn run_installment(
    args: InstallmentArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            term_months: args.term_months
                .ok_or("--term-months is required (or provide --input)")?,
        }
    };

    let result = installment::calculate_loan(&loan_input, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            term_months: args.term_months
                .ok_or("--term-months is required (or provide --input)")?,
            start_date: args.start_date.unwrap_or_else(|| Local::now().date_naive()),
        }
    };

    let result = schedule::build_schedule(&schedule_input, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_validate(
    args: ValidateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let violations = validate_with_limits(
        args.principal,
        args.annual_rate_percent,
        args.term_months,
        &config.limits,
    );
    Ok(json!({
        "valid": violations.is_empty(),
        "violations": violations,
    }))
}

pub fn run_simulate(
    args: SimulateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SimulationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SimulationRequest {
            monto: args.monto.ok_or("--monto is required (or provide --input)")?,
            tasa_interes: args.tasa_interes
                .ok_or("--tasa-interes is required (or provide --input)")?,
            plazo_meses: args.plazo_meses
                .ok_or("--plazo-meses is required (or provide --input)")?,
        }
    };

    let response = wire::simulate(&request, &config.limits)?;
    Ok(serde_json::to_value(response)?)
}
