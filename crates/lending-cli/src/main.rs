mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::comparison::{CounterOfferArgs, MarketArgs, ScenariosArgs};
use commands::loan::{InstallmentArgs, ScheduleArgs, SimulateArgs, ValidateArgs};
use commands::risk::{AffordabilityArgs, ArrearsArgs, EvaluateArgs};
use commands::workflow::OriginateArgs;

/// Loan simulation, amortization and credit evaluation
#[derive(Parser)]
#[command(
    name = "aurora",
    version,
    about = "Loan simulation, amortization and credit evaluation",
    long_about = "A CLI over the Aurora lending engine with decimal precision. \
                  Computes equal-installment loans, amortization tables, arrears \
                  penalties, debt-to-income checks and competitor counter-offers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed monthly installment with total payment and interest
    Installment(InstallmentArgs),
    /// Full amortization table from a start date
    Schedule(ScheduleArgs),
    /// Check loan parameters and list every violation
    Validate(ValidateArgs),
    /// Simulate with the web client's field names (monto, tasaInteres, plazoMeses)
    Simulate(SimulateArgs),
    /// Penalty interest on an overdue installment or schedule
    Arrears(ArrearsArgs),
    /// Debt-to-income capacity check
    Affordability(AffordabilityArgs),
    /// Knock-out rules for a credit application
    Evaluate(EvaluateArgs),
    /// Evaluate an application and, if approved, book it with its schedule
    Originate(OriginateArgs),
    /// Conservative / balanced / risky term scenarios
    Scenarios(ScenariosArgs),
    /// Compare the own offer against a competitor registry
    Market(MarketArgs),
    /// Counter-offer against a competitor quote
    CounterOffer(CounterOfferArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let engine_config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Installment(args) => commands::loan::run_installment(args, &engine_config),
        Commands::Schedule(args) => commands::loan::run_schedule(args, &engine_config),
        Commands::Validate(args) => commands::loan::run_validate(args, &engine_config),
        Commands::Simulate(args) => commands::loan::run_simulate(args, &engine_config),
        Commands::Arrears(args) => commands::risk::run_arrears(args, &engine_config),
        Commands::Affordability(args) => commands::risk::run_affordability(args, &engine_config),
        Commands::Evaluate(args) => commands::risk::run_evaluate(args, &engine_config),
        Commands::Originate(args) => commands::workflow::run_originate(args, &engine_config),
        Commands::Scenarios(args) => commands::comparison::run_scenarios(args, &engine_config),
        Commands::Market(args) => commands::comparison::run_market(args, &engine_config),
        Commands::CounterOffer(args) => {
            commands::comparison::run_counter_offer(args, &engine_config)
        }
        Commands::Version => {
            println!("aurora {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
