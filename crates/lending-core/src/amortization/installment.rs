use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{monthly_rate, round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{LoanTerms, ParameterLimits};
use crate::{LendingError, LendingResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Annual rate as a percentage (18 = 18%).
    pub annual_rate_percent: Percent,
    pub term_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    pub installment: Money,
    /// installment x term
    pub total_payment: Money,
    /// total_payment - principal
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fixed monthly installment for a loan, rounded to cents.
pub fn calculate_installment(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
) -> LendingResult<Money> {
    let terms = LoanTerms::new(principal, annual_rate_percent, term_months)?;
    installment_for(&terms)
}

/// Installment for already-validated terms.
///
/// Zero rate divides the principal evenly; otherwise
/// `P * r(1+r)^n / ((1+r)^n - 1)` with `r` the monthly rate.
pub fn installment_for(terms: &LoanTerms) -> LendingResult<Money> {
    let principal = terms.principal();
    let n = terms.term_months();
    let r = monthly_rate(terms.annual_rate_percent());

    if r.is_zero() {
        return Ok(round_money(principal / Decimal::from(n)));
    }

    let factor = (Decimal::ONE + r)
        .checked_powu(u64::from(n))
        .ok_or_else(|| LendingError::invalid("term_months", "Compounding factor overflowed."))?;

    Ok(round_money(principal * r * factor / (factor - Decimal::ONE)))
}

/// Installment together with total payment and total interest.
pub fn summarize_loan(terms: &LoanTerms) -> LendingResult<LoanSummary> {
    let installment = installment_for(terms)?;
    let total_payment = round_money(installment * Decimal::from(terms.term_months()));

    Ok(LoanSummary {
        principal: terms.principal(),
        annual_rate_percent: terms.annual_rate_percent(),
        term_months: terms.term_months(),
        installment,
        total_payment,
        total_interest: total_payment - terms.principal(),
    })
}

/// Loan simulation wrapped in the standard output envelope.
pub fn calculate_loan(
    input: &LoanInput,
    limits: &ParameterLimits,
) -> LendingResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms::with_limits(
        input.principal,
        input.annual_rate_percent,
        input.term_months,
        limits,
    )?;
    let summary = summarize_loan(&terms)?;

    if terms.annual_rate_percent().is_zero() {
        warnings.push("Zero rate: installment is a flat division of principal.".into());
    }

    log::debug!(
        "installment {} for principal {} at {}% over {} months",
        summary.installment,
        summary.principal,
        summary.annual_rate_percent,
        summary.term_months
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate": monthly_rate(terms.annual_rate_percent()).to_string(),
        "rounding": "2dp, half away from zero",
    });

    Ok(with_metadata(
        "French amortization (equal installments)",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_known_installment() {
        // r = 1.5%, (1.015)^24 = 1.42950281..., 75_000 * 1.4295 / 0.4295
        let inst = calculate_installment(dec!(5_000_000), dec!(18), 24).unwrap();
        assert_eq!(inst, dec!(249_620.51));
    }

    #[test]
    fn test_zero_rate_is_flat_division() {
        let inst = calculate_installment(dec!(1_000_000), Decimal::ZERO, 10).unwrap();
        assert_eq!(inst, dec!(100_000));
    }

    #[test]
    fn test_zero_rate_rounds_to_cents() {
        let inst = calculate_installment(dec!(100), Decimal::ZERO, 3).unwrap();
        assert_eq!(inst, dec!(33.33));
    }

    #[test]
    fn test_single_month_repays_principal_plus_one_month_interest() {
        let inst = calculate_installment(dec!(10_000), dec!(12), 1).unwrap();
        assert_eq!(inst, dec!(10_100));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let err = calculate_installment(dec!(-5), dec!(10), 0).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_summary_totals() {
        let terms = LoanTerms::new(dec!(5_000_000), dec!(18), 24).unwrap();
        let summary = summarize_loan(&terms).unwrap();
        assert_eq!(summary.total_payment, dec!(5_990_892.24));
        assert_eq!(summary.total_interest, dec!(990_892.24));
    }

    #[test]
    fn test_zero_rate_summary_has_no_interest() {
        let terms = LoanTerms::new(dec!(1_000_000), Decimal::ZERO, 10).unwrap();
        let summary = summarize_loan(&terms).unwrap();
        assert_eq!(summary.total_payment, dec!(1_000_000));
        assert_eq!(summary.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_envelope_warns_on_zero_rate() {
        let input = LoanInput {
            principal: dec!(1_000_000),
            annual_rate_percent: Decimal::ZERO,
            term_months: 10,
        };
        let out = calculate_loan(&input, &ParameterLimits::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
