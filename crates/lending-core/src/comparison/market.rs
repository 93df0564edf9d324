//! Competitor comparison and the counter-offer rate policy.
//!
//! Competitor rates are the central bank policy rate (TPM) plus each
//! competitor's spread. When a competitor undercuts the institution's
//! standard offer, the counter-offer is priced at TPM plus the aggressive
//! spread; otherwise the standard rate stands.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::installment::{summarize_loan, LoanSummary};
use crate::comparison::scenarios::{generate_scenarios_with, ScenarioSet};
use crate::config::EngineConfig;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::validation::LoanTerms;
use crate::{LendingError, LendingResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Registry entry for a competing lender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorQuote {
    pub name: String,
    /// Points over the central bank rate.
    pub spread_points: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInput {
    pub principal: Money,
    pub term_months: u32,
    pub central_bank_rate_percent: Percent,
    pub competitors: Vec<CompetitorQuote>,
    /// Overrides the configured standard rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_annual_rate_percent: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorOffer {
    pub name: String,
    pub annual_rate_percent: Percent,
    pub installment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    /// Competitor installment minus own installment.
    pub difference_vs_own: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketComparison {
    pub own: LoanSummary,
    /// Sorted by installment, cheapest first.
    pub offers: Vec<CompetitorOffer>,
    pub own_is_cheapest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest_competitor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOfferStrategy {
    /// Competitor undercuts us: price at TPM + aggressive spread.
    Aggressive,
    /// We already match or beat the competitor: keep the standard rate.
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterOfferInput {
    pub principal: Money,
    pub term_months: u32,
    pub central_bank_rate_percent: Percent,
    pub competitor: CompetitorQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterOffer {
    pub competitor: String,
    pub competitor_rate_percent: Percent,
    pub competitor_installment: Money,
    pub standard_installment: Money,
    pub strategy: CounterOfferStrategy,
    pub applied_rate_percent: Percent,
    pub scenarios: ScenarioSet,
    /// Balanced installment strictly below the competitor's.
    pub beats_competitor: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn competitor_rate(central_bank_rate_percent: Percent, spread_points: Percent) -> Percent {
    central_bank_rate_percent + spread_points
}

/// Own offer against every competitor for the same principal and term.
pub fn compare_market(
    principal: Money,
    term_months: u32,
    central_bank_rate_percent: Percent,
    own_annual_rate_percent: Percent,
    competitors: &[CompetitorQuote],
    config: &EngineConfig,
) -> LendingResult<MarketComparison> {
    let own_terms =
        LoanTerms::with_limits(principal, own_annual_rate_percent, term_months, &config.limits)?;
    let own = summarize_loan(&own_terms)?;

    let mut offers = Vec::with_capacity(competitors.len());
    for competitor in competitors {
        let rate = competitor_rate(central_bank_rate_percent, competitor.spread_points);
        let terms = LoanTerms::with_limits(principal, rate, term_months, &config.limits)?;
        let summary = summarize_loan(&terms)?;
        offers.push(CompetitorOffer {
            name: competitor.name.clone(),
            annual_rate_percent: rate,
            installment: summary.installment,
            total_payment: summary.total_payment,
            total_interest: summary.total_interest,
            difference_vs_own: summary.installment - own.installment,
        });
    }
    offers.sort_by(|a, b| a.installment.cmp(&b.installment).then_with(|| a.name.cmp(&b.name)));

    let cheapest = offers.first();
    let own_is_cheapest = cheapest.map_or(true, |o| own.installment <= o.installment);

    Ok(MarketComparison {
        cheapest_competitor: cheapest.map(|o| o.name.clone()),
        own,
        offers,
        own_is_cheapest,
    })
}

/// Answer a competitor quote with a scenario set priced by the rate policy.
pub fn counter_offer(
    principal: Money,
    term_months: u32,
    central_bank_rate_percent: Percent,
    competitor: &CompetitorQuote,
    config: &EngineConfig,
) -> LendingResult<CounterOffer> {
    if central_bank_rate_percent < Decimal::ZERO {
        return Err(LendingError::invalid(
            "central_bank_rate_percent",
            "Central bank rate cannot be negative.",
        ));
    }

    let competitor_rate_percent =
        competitor_rate(central_bank_rate_percent, competitor.spread_points);
    let competitor_terms =
        LoanTerms::with_limits(principal, competitor_rate_percent, term_months, &config.limits)?;
    let competitor_installment = summarize_loan(&competitor_terms)?.installment;

    let standard_rate = config.rates.standard_annual_rate_percent;
    let standard_terms =
        LoanTerms::with_limits(principal, standard_rate, term_months, &config.limits)?;
    let standard_installment = summarize_loan(&standard_terms)?.installment;

    let undercut = competitor_installment < standard_installment;
    let (strategy, applied_rate_percent, target) = if undercut {
        (
            CounterOfferStrategy::Aggressive,
            central_bank_rate_percent + config.rates.aggressive_spread_points,
            competitor_installment,
        )
    } else {
        (
            CounterOfferStrategy::Standard,
            standard_rate,
            standard_installment,
        )
    };

    let scenarios = generate_scenarios_with(
        target,
        principal,
        term_months,
        applied_rate_percent,
        &config.scenarios,
        &config.limits,
    )?;
    let beats_competitor = scenarios.balanced.installment < competitor_installment;

    log::info!(
        "counter-offer vs {}: {:?} at {}% (competitor {} / ours {})",
        competitor.name,
        strategy,
        applied_rate_percent,
        competitor_installment,
        scenarios.balanced.installment
    );

    Ok(CounterOffer {
        competitor: competitor.name.clone(),
        competitor_rate_percent,
        competitor_installment,
        standard_installment,
        strategy,
        applied_rate_percent,
        scenarios,
        beats_competitor,
    })
}

/// Market comparison wrapped in the standard output envelope.
pub fn calculate_market_comparison(
    input: &MarketInput,
    config: &EngineConfig,
) -> LendingResult<ComputationOutput<MarketComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.competitors.is_empty() {
        warnings.push("No competitors supplied; own offer is trivially cheapest.".into());
    }

    let own_rate = input
        .own_annual_rate_percent
        .unwrap_or(config.rates.standard_annual_rate_percent);
    let comparison = compare_market(
        input.principal,
        input.term_months,
        input.central_bank_rate_percent,
        own_rate,
        &input.competitors,
        config,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "central_bank_rate_percent": input.central_bank_rate_percent.to_string(),
        "own_annual_rate_percent": own_rate.to_string(),
    });

    Ok(with_metadata(
        "Competitor installment comparison (TPM + spread)",
        &assumptions,
        warnings,
        elapsed,
        comparison,
    ))
}

/// Counter-offer wrapped in the standard output envelope.
pub fn calculate_counter_offer(
    input: &CounterOfferInput,
    config: &EngineConfig,
) -> LendingResult<ComputationOutput<CounterOffer>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let offer = counter_offer(
        input.principal,
        input.term_months,
        input.central_bank_rate_percent,
        &input.competitor,
        config,
    )?;

    if offer.strategy == CounterOfferStrategy::Aggressive && !offer.beats_competitor {
        warnings.push(format!(
            "Aggressive rate {}% still does not undercut {}.",
            offer.applied_rate_percent, offer.competitor
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "standard_annual_rate_percent": config.rates.standard_annual_rate_percent.to_string(),
        "aggressive_spread_points": config.rates.aggressive_spread_points.to_string(),
    });

    Ok(with_metadata(
        "Counter-offer (TPM + spread rate policy)",
        &assumptions,
        warnings,
        elapsed,
        offer,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
