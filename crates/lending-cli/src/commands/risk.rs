use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use lending_core::config::EngineConfig;
use lending_core::risk::affordability::{self, AffordabilityInput};
use lending_core::risk::arrears::{self, ArrearsInput};
use lending_core::risk::knockout::{self, EvaluationInput};
use lending_core::types::{Money, Percent};

use crate::input;

/// Arguments for arrears penalties
#[derive(Args)]
pub struct ArrearsArgs {
    /// Path to JSON schedule with payment status (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Overdue installment amount
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Days past the due date
    #[arg(long, allow_hyphen_values = true)]
    pub days_late: Option<i64>,

    /// Annual penalty rate as a percentage (defaults to the configured rate)
    #[arg(long)]
    pub penalty_rate: Option<Decimal>,
}

/// Arguments for the debt-to-income check
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Proposed monthly installment
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Installments already committed every month
    #[arg(long, default_value = "0")]
    pub committed: Decimal,

    /// Maximum debt-to-income ratio as a percentage (defaults to the configured ratio)
    #[arg(long)]
    pub max_ratio: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct PenaltyQuote {
    installment_amount: Money,
    days_late: i64,
    penalty_annual_rate_percent: Percent,
    penalty_amount: Money,
    amount_due: Money,
}

pub fn run_arrears(
    args: ArrearsArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let penalty_rate = args.penalty_rate.unwrap_or(config.penalty_annual_rate_percent);

    let schedule_input: Option<ArrearsInput> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Some(serde_json::from_value(data)?)
    } else {
        None
    };

    if let Some(mut arrears_input) = schedule_input {
        if arrears_input.penalty_annual_rate_percent.is_none() {
            arrears_input.penalty_annual_rate_percent = Some(penalty_rate);
        }
        let result = arrears::calculate_arrears_report(&arrears_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let installment = args.installment
        .ok_or("--installment is required (or provide --input)")?;
    let days_late = args.days_late
        .ok_or("--days-late is required (or provide --input)")?;
    let penalty_amount = arrears::calculate_arrears(installment, days_late, penalty_rate)?;

    let quote = PenaltyQuote {
        installment_amount: installment,
        days_late,
        penalty_annual_rate_percent: penalty_rate,
        penalty_amount,
        amount_due: installment + penalty_amount,
    };
    Ok(serde_json::json!({ "result": quote }))
}

pub fn run_affordability(
    args: AffordabilityArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let afford_input: AffordabilityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AffordabilityInput {
            proposed_installment: args.installment
                .ok_or("--installment is required (or provide --input)")?,
            monthly_income: args.income
                .ok_or("--income is required (or provide --input)")?,
            existing_committed_installments: Some(args.committed),
            max_debt_ratio_percent: args.max_ratio,
        }
    };

    let afford_input = AffordabilityInput {
        max_debt_ratio_percent: afford_input
            .max_debt_ratio_percent
            .or(Some(config.max_debt_ratio_percent)),
        ..afford_input
    };

    let result = affordability::calculate_affordability(&afford_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the knock-out evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON input ({"application", "existing_committed_installments", "existing_arrears"})
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_evaluate(
    args: EvaluateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let eval_input: EvaluationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for evaluation".into());
    };

    let result = knockout::calculate_evaluation(&eval_input, config)?;
    Ok(serde_json::to_value(result)?)
}
