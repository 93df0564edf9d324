use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ParameterViolation;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::{LendingError, LendingResult};

pub const DEFAULT_MAX_DEBT_RATIO_PERCENT: Percent = dec!(40);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub proposed_installment: Money,
    pub monthly_income: Money,
    /// Installments the applicant already pays every month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_committed_installments: Option<Money>,
    /// Share of income that may go to installments (defaults to 40).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_debt_ratio_percent: Option<Percent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityVerdict {
    pub approved: bool,
    /// income x max ratio
    pub total_capacity: Money,
    /// total capacity minus existing commitments; negative when over-committed.
    pub available_capacity: Money,
    pub committed_amount: Money,
    pub committed_ratio_percent: Percent,
    pub proposed_installment: Money,
    /// How far the proposed installment exceeds the available capacity.
    pub shortfall: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare a proposed installment against the applicant's remaining capacity
/// to pay. Advisory: the caller decides what a rejection means.
pub fn assess_affordability(
    proposed_installment: Money,
    monthly_income: Money,
    existing_committed_installments: Money,
    max_debt_ratio_percent: Percent,
) -> LendingResult<AffordabilityVerdict> {
    validate(
        proposed_installment,
        monthly_income,
        existing_committed_installments,
        max_debt_ratio_percent,
    )?;

    let total_capacity = monthly_income
        .checked_mul(max_debt_ratio_percent)
        .map(|v| round_money(v / Decimal::ONE_HUNDRED))
        .ok_or_else(|| too_large("monthly_income"))?;
    let available_capacity = total_capacity
        .checked_sub(existing_committed_installments)
        .ok_or_else(|| too_large("existing_committed_installments"))?;
    let committed_ratio_percent = existing_committed_installments
        .checked_div(monthly_income)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_money)
        .ok_or_else(|| too_large("existing_committed_installments"))?;
    let shortfall = proposed_installment
        .checked_sub(available_capacity)
        .ok_or_else(|| too_large("proposed_installment"))?
        .max(Decimal::ZERO);
    let approved = proposed_installment <= available_capacity;

    Ok(AffordabilityVerdict {
        approved,
        total_capacity,
        available_capacity,
        committed_amount: existing_committed_installments,
        committed_ratio_percent,
        proposed_installment,
        shortfall,
    })
}

/// Affordability verdict wrapped in the standard output envelope.
pub fn calculate_affordability(
    input: &AffordabilityInput,
) -> LendingResult<ComputationOutput<AffordabilityVerdict>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let committed = input.existing_committed_installments.unwrap_or(Decimal::ZERO);
    let max_ratio = input
        .max_debt_ratio_percent
        .unwrap_or(DEFAULT_MAX_DEBT_RATIO_PERCENT);

    let verdict = assess_affordability(
        input.proposed_installment,
        input.monthly_income,
        committed,
        max_ratio,
    )?;

    if verdict.available_capacity < Decimal::ZERO {
        warnings.push("Existing commitments already exceed the debt-to-income limit.".into());
    }
    if !verdict.approved {
        log::warn!(
            "installment {} exceeds available capacity {}",
            verdict.proposed_installment,
            verdict.available_capacity
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "max_debt_ratio_percent": max_ratio.to_string(),
        "existing_committed_installments": committed.to_string(),
    });

    Ok(with_metadata(
        "Debt-to-income capacity check",
        &assumptions,
        warnings,
        elapsed,
        verdict,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn too_large(field: &str) -> LendingError {
    LendingError::invalid(field, "Amount is too large to compute a capacity.")
}

fn validate(
    proposed_installment: Money,
    monthly_income: Money,
    committed: Money,
    max_debt_ratio_percent: Percent,
) -> LendingResult<()> {
    let mut violations = Vec::new();
    if proposed_installment < Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "proposed_installment",
            "Proposed installment cannot be negative.",
        ));
    }
    if monthly_income <= Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "monthly_income",
            "Monthly income must be greater than zero.",
        ));
    }
    if committed < Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "existing_committed_installments",
            "Committed installments cannot be negative.",
        ));
    }
    if max_debt_ratio_percent <= Decimal::ZERO || max_debt_ratio_percent > Decimal::ONE_HUNDRED {
        violations.push(ParameterViolation::new(
            "max_debt_ratio_percent",
            "Maximum debt ratio must be within (0, 100].",
        ));
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(LendingError::InvalidParameters(violations))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_approved_breakdown() {
        let verdict =
            assess_affordability(dec!(249_620.51), dec!(1_500_000), dec!(150_000), dec!(40))
                .unwrap();
        assert_eq!(
            verdict,
            AffordabilityVerdict {
                approved: true,
                total_capacity: dec!(600_000),
                available_capacity: dec!(450_000),
                committed_amount: dec!(150_000),
                committed_ratio_percent: dec!(10),
                proposed_installment: dec!(249_620.51),
                shortfall: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_rejected_with_shortfall() {
        let verdict =
            assess_affordability(dec!(249_620.51), dec!(800_000), dec!(100_000), dec!(40))
                .unwrap();
        // capacity 320k, available 220k
        assert!(!verdict.approved);
        assert_eq!(verdict.available_capacity, dec!(220_000));
        assert_eq!(verdict.shortfall, dec!(29_620.51));
        assert_eq!(verdict.committed_ratio_percent, dec!(12.5));
    }

    #[test]
    fn test_installment_equal_to_capacity_is_approved() {
        let verdict =
            assess_affordability(dec!(400), dec!(1_000), Decimal::ZERO, dec!(40)).unwrap();
        assert!(verdict.approved);
    }

    #[test]
    fn test_zero_income_is_invalid_not_a_panic() {
        let err =
            assess_affordability(dec!(100), Decimal::ZERO, Decimal::ZERO, dec!(40)).unwrap_err();
        assert_eq!(err.violations()[0].field, "monthly_income");
    }

    #[test]
    fn test_income_beyond_decimal_range_is_invalid_not_a_panic() {
        let err =
            assess_affordability(Decimal::ONE, Decimal::MAX, Decimal::ZERO, dec!(40)).unwrap_err();
        assert_eq!(err.violations()[0].field, "monthly_income");
    }

    #[test]
    fn test_shortfall_beyond_decimal_range_is_invalid_not_a_panic() {
        let err =
            assess_affordability(Decimal::MAX, dec!(1_000), Decimal::MAX, dec!(40)).unwrap_err();
        assert_eq!(err.violations()[0].field, "proposed_installment");
    }

    #[test]
    fn test_committed_ratio_rounding() {
        let verdict = assess_affordability(dec!(10), dec!(3_000), dec!(1_000), dec!(40)).unwrap();
        assert_eq!(verdict.committed_ratio_percent, dec!(33.33));
    }

    #[test]
    fn test_over_committed_warning() {
        let input = AffordabilityInput {
            proposed_installment: dec!(100),
            monthly_income: dec!(1_000),
            existing_committed_installments: Some(dec!(500)),
            max_debt_ratio_percent: None,
        };
        let out = calculate_affordability(&input).unwrap();
        assert!(!out.result.approved);
        assert_eq!(out.result.available_capacity, dec!(-100));
        assert_eq!(out.warnings.len(), 1);
    }
}
