use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use lending_core::config::EngineConfig;
use lending_core::wire::{ErrorResponse, SimulationRequest};
use lending_core::LendingError;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parameter errors travel as the client's error body so the backend can
/// forward them untouched.
fn lending_error(e: LendingError) -> napi::Error {
    match serde_json::to_string(&ErrorResponse::from(&e)) {
        Ok(body) => napi::Error::from_reason(body),
        Err(_) => to_napi_error(e),
    }
}

fn parse<T: DeserializeOwned>(json: &str) -> NapiResult<T> {
    serde_json::from_str(json).map_err(to_napi_error)
}

fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    match config_json {
        Some(json) => EngineConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(EngineConfig::default()),
    }
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// `{monto, tasaInteres, plazoMeses}` in, `{cuotaMensual, totalPagar, interesTotal}` out.
#[napi]
pub fn simulate_loan(request_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: SimulationRequest = parse(&request_json)?;
    let config = engine_config(config_json)?;
    let response = lending_core::wire::simulate(&request, &config.limits).map_err(lending_error)?;
    render(&response)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_installment(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let input: lending_core::amortization::installment::LoanInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::amortization::installment::calculate_loan(&input, &config.limits)
        .map_err(lending_error)?;
    render(&output)
}

#[napi]
pub fn build_schedule(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: lending_core::amortization::schedule::ScheduleInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::amortization::schedule::build_schedule(&input, &config.limits)
        .map_err(lending_error)?;
    render(&output)
}

/// Every violated constraint, empty when the parameters are acceptable.
#[napi]
pub fn validate_parameters(
    principal: String,
    annual_rate_percent: String,
    term_months: i64,
) -> NapiResult<String> {
    let principal: Decimal = principal.parse().map_err(to_napi_error)?;
    let rate: Decimal = annual_rate_percent.parse().map_err(to_napi_error)?;
    let violations =
        lending_core::validation::validate_loan_parameters(principal, rate, term_months);
    render(&violations)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_arrears(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let mut input: lending_core::risk::arrears::ArrearsInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    if input.penalty_annual_rate_percent.is_none() {
        input.penalty_annual_rate_percent = Some(config.penalty_annual_rate_percent);
    }
    let output =
        lending_core::risk::arrears::calculate_arrears_report(&input).map_err(lending_error)?;
    render(&output)
}

#[napi]
pub fn check_affordability(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let mut input: lending_core::risk::affordability::AffordabilityInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    if input.max_debt_ratio_percent.is_none() {
        input.max_debt_ratio_percent = Some(config.max_debt_ratio_percent);
    }
    let output = lending_core::risk::affordability::calculate_affordability(&input)
        .map_err(lending_error)?;
    render(&output)
}

#[napi]
pub fn evaluate_application(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: lending_core::risk::knockout::EvaluationInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::risk::knockout::calculate_evaluation(&input, &config)
        .map_err(lending_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_scenarios(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: lending_core::comparison::scenarios::ScenarioInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::comparison::scenarios::calculate_scenarios(
        &input,
        &config.scenarios,
        &config.limits,
    )
    .map_err(lending_error)?;
    render(&output)
}

#[napi]
pub fn compare_market(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: lending_core::comparison::market::MarketInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::comparison::market::calculate_market_comparison(&input, &config)
        .map_err(lending_error)?;
    render(&output)
}

#[napi]
pub fn counter_offer(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: lending_core::comparison::market::CounterOfferInput = parse(&input_json)?;
    let config = engine_config(config_json)?;
    let output = lending_core::comparison::market::calculate_counter_offer(&input, &config)
        .map_err(lending_error)?;
    render(&output)
}
