use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amortization::installment::installment_for;
use crate::amortization::schedule::{schedule_for, AmortizationRow};
use crate::config::EngineConfig;
use crate::risk::affordability::AffordabilityVerdict;
use crate::risk::arrears::{assess_arrears, ArrearsReport};
use crate::risk::knockout::{evaluate_application, CreditApplication, KnockoutDecision};
use crate::types::Money;
use crate::validation::LoanTerms;
use crate::workflow::{LoanId, LoanRepository, NewLoan};
use crate::LendingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OriginationOutcome {
    Approved {
        loan_id: LoanId,
        installment: Money,
        verdict: AffordabilityVerdict,
        schedule: Vec<AmortizationRow>,
    },
    Rejected {
        decision: KnockoutDecision,
    },
}

impl OriginationOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, OriginationOutcome::Approved { .. })
    }
}

/// Takes credit applications through the knock-out rules and, on approval,
/// stores the loan with its complete schedule.
pub struct LoanOriginator<R: LoanRepository> {
    repository: R,
    config: EngineConfig,
}

impl<R: LoanRepository> LoanOriginator<R> {
    pub fn new(repository: R, config: EngineConfig) -> Self {
        Self { repository, config }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Arrears across every open loan of the customer as of `as_of`.
    pub fn customer_arrears(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> LendingResult<ArrearsReport> {
        let mut lines = Vec::new();
        for schedule in self.repository.outstanding_schedules(customer_id)? {
            let report = assess_arrears(
                &schedule.rows,
                &schedule.paid_sequence_numbers,
                as_of,
                self.config.penalty_annual_rate_percent,
            )?;
            lines.extend(report.lines);
        }
        ArrearsReport::from_lines(as_of, lines)
    }

    /// Evaluate an application processed on `today`.
    ///
    /// The schedule is generated in full before the repository is called, and
    /// the repository receives it in one `store_loan` call; a rejected
    /// application stores nothing.
    pub fn originate(
        &mut self,
        application: &CreditApplication,
        today: NaiveDate,
    ) -> LendingResult<OriginationOutcome> {
        let committed = self.repository.committed_installments(&application.customer_id)?;
        let arrears = self.customer_arrears(&application.customer_id, today)?;

        let decision = evaluate_application(application, committed, Some(&arrears), &self.config)?;

        let verdict = match decision.verdict.clone() {
            Some(verdict) if decision.approved => verdict,
            _ => {
                log::warn!(
                    "application for {} rejected: {}",
                    application.customer_id,
                    decision
                        .reasons
                        .iter()
                        .map(|r| r.message())
                        .collect::<Vec<_>>()
                        .join(" | ")
                );
                return Ok(OriginationOutcome::Rejected { decision });
            }
        };

        let terms = LoanTerms::with_limits(
            application.principal,
            application.annual_rate_percent,
            application.term_months,
            &self.config.limits,
        )?;
        let installment = installment_for(&terms)?;
        let disbursement_date = application.disbursement_date.unwrap_or(today);
        let schedule = schedule_for(&terms, disbursement_date)?;

        let loan_id = self.repository.store_loan(NewLoan {
            customer_id: application.customer_id.clone(),
            terms,
            installment,
            disbursement_date,
            rows: schedule.clone(),
        })?;

        log::info!(
            "loan {} approved for {}: {} x {} months",
            loan_id,
            application.customer_id,
            installment,
            terms.term_months()
        );

        Ok(OriginationOutcome::Approved {
            loan_id,
            installment,
            verdict,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::knockout::KnockoutReason;
    use crate::workflow::memory::InMemoryLoanRepository;
    use crate::workflow::OutstandingSchedule;
    use crate::LendingError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn application(customer: &str, principal: Decimal, income: Decimal) -> CreditApplication {
        CreditApplication {
            customer_id: customer.into(),
            principal,
            annual_rate_percent: dec!(18),
            term_months: 24,
            monthly_income: income,
            disbursement_date: None,
        }
    }

    #[test]
    fn test_approved_loan_is_stored_with_full_schedule() {
        let mut originator =
            LoanOriginator::new(InMemoryLoanRepository::new(), EngineConfig::default());
        let outcome = originator
            .originate(&application("ana", dec!(5_000_000), dec!(1_500_000)), date(2024, 1, 15))
            .unwrap();

        match outcome {
            OriginationOutcome::Approved { loan_id, installment, schedule, .. } => {
                assert_eq!(loan_id, 1);
                assert_eq!(installment, dec!(249_620.51));
                assert_eq!(schedule.len(), 24);
                assert_eq!(schedule[0].due_date, date(2024, 2, 15));
            }
            other => panic!("Expected approval, got {other:?}"),
        }
        let stored = originator.repository().loans();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].loan.rows.len(), 24);
    }

    #[test]
    fn test_second_loan_counts_first_as_committed() {
        let mut originator =
            LoanOriginator::new(InMemoryLoanRepository::new(), EngineConfig::default());
        let today = date(2024, 1, 15);
        // capacity 600k; first loan uses 249_620.51
        assert!(originator
            .originate(&application("ana", dec!(5_000_000), dec!(1_500_000)), today)
            .unwrap()
            .is_approved());
        let second = originator
            .originate(&application("ana", dec!(8_000_000), dec!(1_500_000)), today)
            .unwrap();

        match second {
            OriginationOutcome::Rejected { decision } => {
                let verdict = decision.verdict.unwrap();
                assert_eq!(verdict.committed_amount, dec!(249_620.51));
                assert!(matches!(
                    decision.reasons[0],
                    KnockoutReason::InsufficientCapacity { .. }
                ));
            }
            other => panic!("Expected rejection, got {other:?}"),
        }
        assert_eq!(originator.repository().loans().len(), 1);
    }

    #[test]
    fn test_overdue_installments_knock_out_new_credit() {
        let mut originator =
            LoanOriginator::new(InMemoryLoanRepository::new(), EngineConfig::default());
        assert!(originator
            .originate(&application("luis", dec!(1_000_000), dec!(2_000_000)), date(2024, 1, 10))
            .unwrap()
            .is_approved());

        // first installment fell due 2024-02-10 and was never paid
        let outcome = originator
            .originate(&application("luis", dec!(500_000), dec!(2_000_000)), date(2024, 3, 1))
            .unwrap();
        match outcome {
            OriginationOutcome::Rejected { decision } => {
                assert!(decision.reasons.iter().any(|r| matches!(
                    r,
                    KnockoutReason::ExistingArrears { overdue_count: 1, .. }
                )));
            }
            other => panic!("Expected rejection, got {other:?}"),
        }

        originator.repository_mut().record_payment(1, 1).unwrap();
        assert!(originator
            .originate(&application("luis", dec!(500_000), dec!(2_000_000)), date(2024, 3, 1))
            .unwrap()
            .is_approved());
    }

    struct FailingStore;

    impl LoanRepository for FailingStore {
        fn committed_installments(&self, _customer_id: &str) -> LendingResult<Money> {
            Ok(Decimal::ZERO)
        }

        fn outstanding_schedules(
            &self,
            _customer_id: &str,
        ) -> LendingResult<Vec<OutstandingSchedule>> {
            Ok(Vec::new())
        }

        fn store_loan(&mut self, _loan: NewLoan) -> LendingResult<LoanId> {
            Err(LendingError::Repository("disk full".into()))
        }
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut originator = LoanOriginator::new(FailingStore, EngineConfig::default());
        let err = originator
            .originate(&application("eva", dec!(1_000_000), dec!(2_000_000)), date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, LendingError::Repository(_)));
    }
}
