//! Conservative / balanced / risky repayment scenarios around a base term.
//!
//! Each scenario is the same principal at the same rate over a different
//! term. The three terms are always pairwise distinct: when the configured
//! multiplier lands on the base term, a fixed offset is applied, and when the
//! floor or cap still collides the next wider bound is used. The cap is kept
//! even when it makes the risky term shorter than the base.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::installment::summarize_loan;
use crate::config::ScenarioPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{validate_with_limits, LoanTerms, ParameterLimits};
use crate::{LendingError, LendingResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub target_monthly_payment: Money,
    pub principal: Money,
    pub base_term_months: u32,
    pub effective_annual_rate: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub term_months: u32,
    pub installment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub effective_annual_rate: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub target_monthly_payment: Money,
    pub principal: Money,
    pub conservative: Scenario,
    pub balanced: Scenario,
    pub risky: Scenario,
    /// Target minus the balanced installment; positive when balanced is cheaper.
    pub balanced_savings_vs_target: Money,
}

impl ScenarioSet {
    pub fn terms(&self) -> [u32; 3] {
        [
            self.conservative.term_months,
            self.balanced.term_months,
            self.risky.term_months,
        ]
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scenarios under the default term policy and parameter limits.
pub fn generate_scenarios(
    target_monthly_payment: Money,
    principal: Money,
    base_term_months: u32,
    effective_annual_rate: Percent,
) -> LendingResult<ScenarioSet> {
    generate_scenarios_with(
        target_monthly_payment,
        principal,
        base_term_months,
        effective_annual_rate,
        &ScenarioPolicy::default(),
        &ParameterLimits::default(),
    )
}

pub fn generate_scenarios_with(
    target_monthly_payment: Money,
    principal: Money,
    base_term_months: u32,
    effective_annual_rate: Percent,
    policy: &ScenarioPolicy,
    limits: &ParameterLimits,
) -> LendingResult<ScenarioSet> {
    let mut violations = validate_with_limits(
        principal,
        effective_annual_rate,
        i64::from(base_term_months),
        limits,
    );
    if target_monthly_payment < Decimal::ZERO {
        violations.push(crate::error::ParameterViolation::new(
            "target_monthly_payment",
            "Target payment cannot be negative.",
        ));
    }
    if !violations.is_empty() {
        return Err(LendingError::InvalidParameters(violations));
    }

    let [conservative_months, _, risky_months] =
        scenario_terms(base_term_months, policy, limits.max_term_months).ok_or_else(|| {
            LendingError::invalid(
                "base_term_months",
                "Base term leaves no room for three distinct scenarios.",
            )
        })?;

    let scenario = |term_months: u32| -> LendingResult<Scenario> {
        let terms = LoanTerms::with_limits(principal, effective_annual_rate, term_months, limits)?;
        let summary = summarize_loan(&terms)?;
        Ok(Scenario {
            term_months,
            installment: summary.installment,
            total_payment: summary.total_payment,
            total_interest: summary.total_interest,
            effective_annual_rate,
        })
    };

    let balanced = scenario(base_term_months)?;
    let conservative = scenario(conservative_months)?;
    let risky = scenario(risky_months)?;

    log::debug!(
        "scenarios at {}%: {} / {} / {} months",
        effective_annual_rate,
        conservative_months,
        base_term_months,
        risky_months
    );

    Ok(ScenarioSet {
        target_monthly_payment,
        principal,
        balanced_savings_vs_target: target_monthly_payment - balanced.installment,
        conservative,
        balanced,
        risky,
    })
}

/// Shortened term: `max(floor, floor(base * factor))`. When that equals the
/// base it is forced to `max(floor, base - offset)`, and when that still
/// equals the base, to half the base. `None` when every candidate is the base.
pub fn conservative_term(base_term_months: u32, policy: &ScenarioPolicy) -> Option<u32> {
    let scaled = (Decimal::from(base_term_months) * policy.conservative_factor)
        .floor()
        .to_u32()?;
    let candidates = [
        scaled.max(policy.conservative_floor_months),
        base_term_months
            .saturating_sub(policy.conservative_offset_months)
            .max(policy.conservative_floor_months),
        (base_term_months / 2).max(1),
    ];
    candidates.into_iter().find(|&t| t != base_term_months)
}

/// Extended term: `min(cap, ceil(base * factor))`. When that equals the base
/// it is forced to `min(cap, base + offset)`, and when that still equals the
/// base, to `min(max_term, base + offset)`.
pub fn risky_term(
    base_term_months: u32,
    policy: &ScenarioPolicy,
    max_term_months: u32,
) -> Option<u32> {
    let scaled = (Decimal::from(base_term_months) * policy.risky_factor)
        .ceil()
        .to_u32()?;
    let offset = base_term_months.saturating_add(policy.risky_offset_months);
    let candidates = [
        scaled.min(policy.risky_cap_months),
        offset.min(policy.risky_cap_months),
        offset.min(max_term_months),
    ];
    candidates.into_iter().find(|&t| t != base_term_months)
}

/// Conservative, balanced and risky terms, pairwise distinct.
///
/// The cap and floor can make the two alternatives meet (base 4 gives 6 and
/// 6, base 100 gives 60 and 60); the risky term then takes
/// `min(max_term, base + offset)`.
pub fn scenario_terms(
    base_term_months: u32,
    policy: &ScenarioPolicy,
    max_term_months: u32,
) -> Option<[u32; 3]> {
    let conservative = conservative_term(base_term_months, policy)?;
    let mut risky = risky_term(base_term_months, policy, max_term_months)?;
    if risky == conservative {
        risky = base_term_months
            .saturating_add(policy.risky_offset_months)
            .min(max_term_months);
    }
    let terms = [conservative, base_term_months, risky];
    let distinct = terms[0] != terms[1] && terms[1] != terms[2] && terms[0] != terms[2];
    distinct.then_some(terms)
}

/// Scenario set wrapped in the standard output envelope.
pub fn calculate_scenarios(
    input: &ScenarioInput,
    policy: &ScenarioPolicy,
    limits: &ParameterLimits,
) -> LendingResult<ComputationOutput<ScenarioSet>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let set = generate_scenarios_with(
        input.target_monthly_payment,
        input.principal,
        input.base_term_months,
        input.effective_annual_rate,
        policy,
        limits,
    )?;

    if set.balanced_savings_vs_target < Decimal::ZERO {
        warnings.push(format!(
            "Balanced installment is {} above the target payment.",
            -set.balanced_savings_vs_target
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "conservative_factor": policy.conservative_factor.to_string(),
        "conservative_floor_months": policy.conservative_floor_months,
        "risky_factor": policy.risky_factor.to_string(),
        "risky_cap_months": policy.risky_cap_months,
    });

    Ok(with_metadata(
        "Term scenarios at a fixed effective rate",
        &assumptions,
        warnings,
        elapsed,
        set,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
