//! Penalty interest (mora) on overdue installments.
//!
//! Penalties accrue on a 365-day year at a flat annual penalty rate. Nothing
//! here changes an installment's status; callers decide when a row is overdue
//! and ask for the amount.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::AmortizationRow;
use crate::error::ParameterViolation;
use crate::types::{checked_sum, round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::{LendingError, LendingResult};

pub const DEFAULT_PENALTY_ANNUAL_RATE_PERCENT: Percent = dec!(10);

const DAYS_PER_YEAR: Decimal = dec!(365);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrearsState {
    pub days_late: u32,
    pub penalty_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrearsInput {
    pub rows: Vec<AmortizationRow>,
    /// Sequence numbers of rows already settled.
    #[serde(default)]
    pub paid_sequence_numbers: Vec<u32>,
    pub as_of: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_annual_rate_percent: Option<Percent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrearsLine {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub installment_amount: Money,
    pub days_late: u32,
    pub penalty_amount: Money,
    /// installment + penalty
    pub amount_due: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrearsReport {
    pub as_of: NaiveDate,
    pub lines: Vec<ArrearsLine>,
    pub overdue_installments: Money,
    pub total_penalty: Money,
    pub total_due: Money,
    pub max_days_late: u32,
}

impl ArrearsReport {
    /// Report with totals computed from its lines.
    pub fn from_lines(as_of: NaiveDate, lines: Vec<ArrearsLine>) -> LendingResult<Self> {
        let too_large = || LendingError::invalid("rows", "Overdue amounts are too large to total.");
        let overdue_installments =
            checked_sum(lines.iter().map(|l| l.installment_amount)).ok_or_else(too_large)?;
        let total_penalty =
            checked_sum(lines.iter().map(|l| l.penalty_amount)).ok_or_else(too_large)?;
        let total_due = overdue_installments
            .checked_add(total_penalty)
            .ok_or_else(too_large)?;
        let max_days_late = lines.iter().map(|l| l.days_late).max().unwrap_or(0);

        Ok(ArrearsReport {
            as_of,
            lines,
            overdue_installments,
            total_penalty,
            total_due,
            max_days_late,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Penalty on one installment: `installment * (rate / 365) * days_late`,
/// rounded to cents.
pub fn calculate_arrears(
    installment_amount: Money,
    days_late: i64,
    penalty_annual_rate_percent: Percent,
) -> LendingResult<Money> {
    let mut violations = Vec::new();
    if installment_amount <= Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "installment_amount",
            "Installment amount must be greater than zero.",
        ));
    }
    if days_late < 0 {
        violations.push(ParameterViolation::new(
            "days_late",
            "Days late cannot be negative.",
        ));
    }
    if penalty_annual_rate_percent < Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "penalty_annual_rate_percent",
            "Penalty rate cannot be negative.",
        ));
    }
    if !violations.is_empty() {
        return Err(LendingError::InvalidParameters(violations));
    }

    let daily_rate = penalty_annual_rate_percent / Decimal::ONE_HUNDRED / DAYS_PER_YEAR;
    let penalty = installment_amount
        .checked_mul(daily_rate)
        .and_then(|daily| daily.checked_mul(Decimal::from(days_late)))
        .ok_or_else(|| {
            LendingError::invalid(
                "installment_amount",
                "Penalty is too large to compute for this installment and delay.",
            )
        })?;
    Ok(round_money(penalty))
}

/// Arrears state of a row as of a date, `None` when it is not yet due.
pub fn arrears_state(
    row: &AmortizationRow,
    as_of: NaiveDate,
    penalty_annual_rate_percent: Percent,
) -> LendingResult<Option<ArrearsState>> {
    let days_late = (as_of - row.due_date).num_days();
    if days_late <= 0 {
        return Ok(None);
    }
    let penalty_amount =
        calculate_arrears(row.installment_amount, days_late, penalty_annual_rate_percent)?;
    Ok(Some(ArrearsState {
        days_late: u32::try_from(days_late).unwrap_or(u32::MAX),
        penalty_amount,
    }))
}

/// Every unpaid row whose due date is before `as_of`, with its penalty.
pub fn assess_arrears(
    rows: &[AmortizationRow],
    paid_sequence_numbers: &[u32],
    as_of: NaiveDate,
    penalty_annual_rate_percent: Percent,
) -> LendingResult<ArrearsReport> {
    let mut lines = Vec::new();

    for row in rows {
        if paid_sequence_numbers.contains(&row.sequence_number) {
            continue;
        }
        if let Some(state) = arrears_state(row, as_of, penalty_annual_rate_percent)? {
            let amount_due = row
                .installment_amount
                .checked_add(state.penalty_amount)
                .ok_or_else(|| {
                    LendingError::invalid("rows", "Overdue amount is too large to compute.")
                })?;
            lines.push(ArrearsLine {
                sequence_number: row.sequence_number,
                due_date: row.due_date,
                installment_amount: row.installment_amount,
                days_late: state.days_late,
                penalty_amount: state.penalty_amount,
                amount_due,
            });
        }
    }

    ArrearsReport::from_lines(as_of, lines)
}

/// Arrears report wrapped in the standard output envelope.
pub fn calculate_arrears_report(
    input: &ArrearsInput,
) -> LendingResult<ComputationOutput<ArrearsReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let penalty_rate = input
        .penalty_annual_rate_percent
        .unwrap_or(DEFAULT_PENALTY_ANNUAL_RATE_PERCENT);

    for seq in &input.paid_sequence_numbers {
        if !input.rows.iter().any(|r| r.sequence_number == *seq) {
            warnings.push(format!("Paid sequence number {seq} does not match any row."));
        }
    }

    let report = assess_arrears(
        &input.rows,
        &input.paid_sequence_numbers,
        input.as_of,
        penalty_rate,
    )?;

    if !report.lines.is_empty() {
        log::info!(
            "{} overdue installments as of {}, penalty {}",
            report.lines.len(),
            report.as_of,
            report.total_penalty
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "penalty_annual_rate_percent": penalty_rate.to_string(),
        "day_count": "actual/365",
    });

    Ok(with_metadata(
        "Arrears penalty accrual (simple daily interest)",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(seq: u32, due: NaiveDate) -> AmortizationRow {
        AmortizationRow {
            sequence_number: seq,
            installment_amount: dec!(100_000),
            interest_portion: dec!(10_000),
            capital_portion: dec!(90_000),
            remaining_balance: dec!(500_000),
            due_date: due,
        }
    }

    #[test]
    fn test_thirty_days_at_ten_percent() {
        let penalty = calculate_arrears(dec!(100_000), 30, dec!(10)).unwrap();
        assert_eq!(penalty, dec!(821.92));
    }

    #[test]
    fn test_zero_days_zero_penalty() {
        let penalty =
            calculate_arrears(dec!(100_000), 0, DEFAULT_PENALTY_ANNUAL_RATE_PERCENT).unwrap();
        assert_eq!(penalty, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_inputs_collected() {
        let err = calculate_arrears(Decimal::ZERO, -1, dec!(-2)).unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn test_overflowing_penalty_is_invalid_not_a_panic() {
        let installment = dec!(10_000_000_000_000_000_000_000_000);
        let err = calculate_arrears(installment, 1_000_000_000, dec!(10)).unwrap_err();
        assert_eq!(err.violations()[0].field, "installment_amount");
    }

    #[test]
    fn test_totals_beyond_decimal_range_rejected() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let line = |seq: u32| ArrearsLine {
            sequence_number: seq,
            due_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            installment_amount: Decimal::MAX,
            days_late: 31,
            penalty_amount: Decimal::ZERO,
            amount_due: Decimal::MAX,
        };
        let err = ArrearsReport::from_lines(as_of, vec![line(1), line(2)]).unwrap_err();
        assert_eq!(err.violations()[0].field, "rows");
    }

    #[test]
    fn test_state_only_after_due_date() {
        let r = row(1, date(2024, 5, 10));
        assert_eq!(arrears_state(&r, date(2024, 5, 10), dec!(10)).unwrap(), None);
        assert_eq!(arrears_state(&r, date(2024, 5, 1), dec!(10)).unwrap(), None);
        let state = arrears_state(&r, date(2024, 6, 9), dec!(10)).unwrap().unwrap();
        assert_eq!(state.days_late, 30);
        assert_eq!(state.penalty_amount, dec!(821.92));
    }

    #[test]
    fn test_report_skips_paid_and_future_rows() {
        let rows = vec![
            row(1, date(2024, 4, 10)),
            row(2, date(2024, 5, 10)),
            row(3, date(2024, 6, 10)),
        ];
        let report = assess_arrears(&rows, &[1], date(2024, 6, 9), dec!(10)).unwrap();
        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].sequence_number, 2);
        assert_eq!(report.lines[0].amount_due, dec!(100_821.92));
        assert_eq!(report.total_due, dec!(100_821.92));
        assert_eq!(report.max_days_late, 30);
    }

    #[test]
    fn test_envelope_flags_unknown_paid_rows() {
        let input = ArrearsInput {
            rows: vec![row(1, date(2024, 4, 10))],
            paid_sequence_numbers: vec![7],
            as_of: date(2024, 4, 20),
            penalty_annual_rate_percent: None,
        };
        let out = calculate_arrears_report(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.lines[0].days_late, 10);
    }
}
