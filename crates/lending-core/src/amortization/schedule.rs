use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::installment::installment_for;
use crate::types::{monthly_rate, round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{LoanTerms, ParameterLimits};
use crate::{LendingError, LendingResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    /// Disbursement date; row `i` falls due `i` calendar months later.
    pub start_date: NaiveDate,
}

/// One period of an amortization table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub sequence_number: u32,
    pub installment_amount: Money,
    pub interest_portion: Money,
    pub capital_portion: Money,
    pub remaining_balance: Money,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub installment: Money,
    pub rows: Vec<AmortizationRow>,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_capital: Money,
    /// Final row installment minus the regular installment (rounding residue).
    pub final_row_adjustment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Full amortization table, one row per month.
pub fn generate_schedule(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
    start_date: NaiveDate,
) -> LendingResult<Vec<AmortizationRow>> {
    let terms = LoanTerms::new(principal, annual_rate_percent, term_months)?;
    schedule_for(&terms, start_date)
}

/// Amortization table for already-validated terms.
///
/// Interest, capital and balance are each rounded to cents before feeding the
/// next step. The last row repays whatever balance remains, so its installment
/// absorbs the rounding residue and the table always closes at zero. Capital
/// never exceeds the outstanding balance.
pub fn schedule_for(
    terms: &LoanTerms,
    start_date: NaiveDate,
) -> LendingResult<Vec<AmortizationRow>> {
    let installment = installment_for(terms)?;
    let r = monthly_rate(terms.annual_rate_percent());
    let n = terms.term_months();

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = terms.principal();

    for i in 1..=n {
        let interest = round_money(balance * r);
        let due_date = due_date(start_date, i)?;

        let row = if i == n {
            AmortizationRow {
                sequence_number: i,
                installment_amount: round_money(interest + balance),
                interest_portion: interest,
                capital_portion: balance,
                remaining_balance: Decimal::ZERO,
                due_date,
            }
        } else {
            // rounding up can repay a tiny principal early; later rows owe nothing
            let capital = round_money(installment - interest).min(balance);
            let remaining = round_money(balance - capital).max(Decimal::ZERO);
            AmortizationRow {
                sequence_number: i,
                installment_amount: (interest + capital).min(installment),
                interest_portion: interest,
                capital_portion: capital,
                remaining_balance: remaining,
                due_date,
            }
        };

        balance = row.remaining_balance;
        rows.push(row);
    }

    Ok(rows)
}

/// `start` advanced by `months` calendar months. A day that does not exist in
/// the target month is clamped to that month's last day (Jan 31 -> Feb 28/29).
pub fn due_date(start: NaiveDate, months: u32) -> LendingResult<NaiveDate> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            LendingError::DateError(format!("{start} + {months} months is out of range"))
        })
}

/// Schedule with totals, wrapped in the standard output envelope.
pub fn build_schedule(
    input: &ScheduleInput,
    limits: &ParameterLimits,
) -> LendingResult<ComputationOutput<ScheduleReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms::with_limits(
        input.principal,
        input.annual_rate_percent,
        input.term_months,
        limits,
    )?;
    let installment = installment_for(&terms)?;
    let rows = schedule_for(&terms, input.start_date)?;

    let total_paid: Money = rows.iter().map(|r| r.installment_amount).sum();
    let total_interest: Money = rows.iter().map(|r| r.interest_portion).sum();
    let total_capital: Money = rows.iter().map(|r| r.capital_portion).sum();
    let final_row_adjustment = rows
        .last()
        .map(|r| r.installment_amount - installment)
        .unwrap_or(Decimal::ZERO);

    if !final_row_adjustment.is_zero() {
        warnings.push(format!(
            "Final installment adjusted by {final_row_adjustment} to close the balance."
        ));
    }

    log::debug!(
        "schedule of {} rows from {}: total paid {}, total interest {}",
        rows.len(),
        input.start_date,
        total_paid,
        total_interest
    );

    let report = ScheduleReport {
        installment,
        rows,
        total_paid,
        total_interest,
        total_capital,
        final_row_adjustment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "start_date": input.start_date.to_string(),
        "month_end_policy": "clamp to last day of month",
        "residue_policy": "absorbed in final row",
    });

    Ok(with_metadata(
        "French amortization schedule (stepwise 2dp rounding)",
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
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_row_split() {
        let rows = generate_schedule(dec!(5_000_000), dec!(18), 24, date(2024, 3, 15)).unwrap();
        assert_eq!(
            rows[0],
            AmortizationRow {
                sequence_number: 1,
                installment_amount: dec!(249_620.51),
                interest_portion: dec!(75_000.00),
                capital_portion: dec!(174_620.51),
                remaining_balance: dec!(4_825_379.49),
                due_date: date(2024, 4, 15),
            }
        );
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let rows = generate_schedule(dec!(5_000_000), dec!(18), 24, date(2024, 3, 15)).unwrap();
        assert_eq!(rows.len(), 24);
        let last = rows.last().unwrap();
        assert_eq!(last.sequence_number, 24);
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert!((last.installment_amount - dec!(249_620.51)).abs() <= dec!(1));
        assert_eq!(last.due_date, date(2026, 3, 15));
    }

    #[test]
    fn test_row_invariants_hold() {
        let rows = generate_schedule(dec!(750_000), dec!(23.5), 36, date(2025, 1, 10)).unwrap();
        let mut previous = dec!(750_000);
        let r = monthly_rate(dec!(23.5));
        for row in &rows {
            assert_eq!(row.interest_portion, round_money(previous * r));
            assert_eq!(
                row.capital_portion,
                round_money(row.installment_amount - row.interest_portion)
            );
            assert!(row.remaining_balance >= Decimal::ZERO);
            previous = row.remaining_balance;
        }
    }

    #[test]
    fn test_zero_rate_schedule() {
        let rows = generate_schedule(dec!(1_000_000), Decimal::ZERO, 10, date(2024, 1, 1)).unwrap();
        assert!(rows.iter().all(|r| r.interest_portion.is_zero()));
        assert!(rows.iter().all(|r| r.capital_portion == dec!(100_000)));
        assert_eq!(rows[4].remaining_balance, dec!(500_000));
        assert_eq!(rows[9].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_sub_unit_principal_not_overcharged() {
        // 0.05 / 10 rounds up to 0.01, which repays the loan by row 5
        let rows = generate_schedule(dec!(0.05), Decimal::ZERO, 10, date(2024, 1, 1)).unwrap();
        let repaid: Decimal = rows.iter().map(|r| r.capital_portion).sum();
        assert_eq!(repaid, dec!(0.05));
        assert_eq!(rows[4].remaining_balance, Decimal::ZERO);
        assert!(rows[5..].iter().all(|r| r.installment_amount.is_zero()));
        assert!(rows[5..].iter().all(|r| r.capital_portion.is_zero()));
    }

    #[test]
    fn test_month_end_clamping() {
        let rows = generate_schedule(dec!(1_200), Decimal::ZERO, 4, date(2024, 1, 31)).unwrap();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.due_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30), date(2024, 5, 31)]
        );
    }

    #[test]
    fn test_invalid_terms_produce_no_rows() {
        let err = generate_schedule(dec!(1_000), dec!(10), 0, date(2024, 1, 1)).unwrap_err();
        assert_eq!(err.violations()[0].field, "term_months");
    }

    #[test]
    fn test_report_totals() {
        let input = ScheduleInput {
            principal: dec!(5_000_000),
            annual_rate_percent: dec!(18),
            term_months: 24,
            start_date: date(2024, 3, 15),
        };
        let out = build_schedule(&input, &ParameterLimits::default()).unwrap();
        let report = &out.result;
        assert_eq!(report.total_capital, dec!(5_000_000));
        assert_eq!(report.total_paid, report.total_capital + report.total_interest);
        assert_eq!(
            report.final_row_adjustment,
            report.rows[23].installment_amount - report.installment
        );
    }

    #[test]
    fn test_due_date_out_of_range() {
        let err = due_date(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, LendingError::DateError(_)));
    }
}
