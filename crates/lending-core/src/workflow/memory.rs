//! In-process implementations of the workflow collaborators.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::comparison::market::CompetitorQuote;
use crate::types::{Money, Percent};
use crate::workflow::{LoanId, LoanRepository, MarketDataSource, NewLoan, OutstandingSchedule};
use crate::{LendingError, LendingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLoan {
    pub id: LoanId,
    pub loan: NewLoan,
    pub paid_sequence_numbers: Vec<u32>,
}

impl StoredLoan {
    pub fn is_settled(&self) -> bool {
        self.loan
            .rows
            .iter()
            .all(|r| self.paid_sequence_numbers.contains(&r.sequence_number))
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryLoanRepository {
    loans: Vec<StoredLoan>,
    /// Installments owed to other lenders, keyed by customer.
    external_commitments: HashMap<String, Money>,
    next_id: LoanId,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_external_commitment(mut self, customer_id: &str, monthly: Money) -> Self {
        self.external_commitments.insert(customer_id.to_string(), monthly);
        self
    }

    pub fn loans(&self) -> &[StoredLoan] {
        &self.loans
    }

    pub fn record_payment(&mut self, loan_id: LoanId, sequence_number: u32) -> LendingResult<()> {
        let stored = self
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| LendingError::Repository(format!("loan {loan_id} not found")))?;
        if !stored.loan.rows.iter().any(|r| r.sequence_number == sequence_number) {
            return Err(LendingError::Repository(format!(
                "loan {loan_id} has no installment {sequence_number}"
            )));
        }
        if !stored.paid_sequence_numbers.contains(&sequence_number) {
            stored.paid_sequence_numbers.push(sequence_number);
        }
        Ok(())
    }

    fn open_loans<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a StoredLoan> + 'a {
        self.loans
            .iter()
            .filter(move |l| l.loan.customer_id == customer_id && !l.is_settled())
    }
}

impl LoanRepository for InMemoryLoanRepository {
    fn committed_installments(&self, customer_id: &str) -> LendingResult<Money> {
        let external = self
            .external_commitments
            .get(customer_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let own: Money = self.open_loans(customer_id).map(|l| l.loan.installment).sum();
        Ok(external + own)
    }

    fn outstanding_schedules(&self, customer_id: &str) -> LendingResult<Vec<OutstandingSchedule>> {
        Ok(self
            .open_loans(customer_id)
            .map(|l| OutstandingSchedule {
                loan_id: l.id,
                rows: l.loan.rows.clone(),
                paid_sequence_numbers: l.paid_sequence_numbers.clone(),
            })
            .collect())
    }

    fn store_loan(&mut self, loan: NewLoan) -> LendingResult<LoanId> {
        if loan.rows.is_empty() {
            return Err(LendingError::Repository(
                "refusing to store a loan without a schedule".into(),
            ));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.loans.push(StoredLoan {
            id,
            loan,
            paid_sequence_numbers: Vec::new(),
        });
        Ok(id)
    }
}

/// Fixed market snapshot: a central bank rate and a competitor registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticMarketData {
    pub central_bank_rate_percent: Percent,
    pub competitors: Vec<CompetitorQuote>,
}

impl MarketDataSource for StaticMarketData {
    fn central_bank_rate(&self) -> LendingResult<Percent> {
        Ok(self.central_bank_rate_percent)
    }

    fn competitors(&self) -> LendingResult<Vec<CompetitorQuote>> {
        Ok(self.competitors.clone())
    }
}
