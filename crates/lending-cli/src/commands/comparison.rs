use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::comparison::market::{self, CompetitorQuote, CounterOfferInput, MarketInput};
use lending_core::comparison::scenarios::{self, ScenarioInput};
use lending_core::config::EngineConfig;

use crate::input;

/// Arguments for term scenarios
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly payment the scenarios are measured against
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Base term in months
    #[arg(long, alias = "term")]
    pub base_term_months: Option<u32>,

    /// Effective annual rate as a percentage
    #[arg(long, alias = "rate")]
    pub effective_annual_rate: Option<Decimal>,
}

/// Arguments for the market comparison
#[derive(Args)]
pub struct MarketArgs {
    /// Path to JSON input file with the competitor registry
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a counter-offer
#[derive(Args)]
pub struct CounterOfferArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Central bank policy rate (TPM) as a percentage
    #[arg(long)]
    pub tpm: Option<Decimal>,

    /// Competitor name
    #[arg(long)]
    pub competitor: Option<String>,

    /// Competitor spread over TPM in points
    #[arg(long)]
    pub spread: Option<Decimal>,
}

pub fn run_scenarios(
    args: ScenariosArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: ScenarioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScenarioInput {
            target_monthly_payment: args.target
                .ok_or("--target is required (or provide --input)")?,
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            base_term_months: args.base_term_months
                .ok_or("--base-term-months is required (or provide --input)")?,
            effective_annual_rate: args.effective_annual_rate
                .ok_or("--effective-annual-rate is required (or provide --input)")?,
        }
    };

    let result =
        scenarios::calculate_scenarios(&scenario_input, &config.scenarios, &config.limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_market(
    args: MarketArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let market_input: MarketInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for market comparison".into());
    };

    let result = market::calculate_market_comparison(&market_input, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_counter_offer(
    args: CounterOfferArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let offer_input: CounterOfferInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CounterOfferInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            term_months: args.term_months
                .ok_or("--term-months is required (or provide --input)")?,
            central_bank_rate_percent: args.tpm
                .ok_or("--tpm is required (or provide --input)")?,
            competitor: CompetitorQuote {
                name: args.competitor.unwrap_or_else(|| "competitor".to_string()),
                spread_points: args.spread
                    .ok_or("--spread is required (or provide --input)")?,
            },
        }
    };

    let result = market::calculate_counter_offer(&offer_input, config)?;
    Ok(serde_json::to_value(result)?)
}
