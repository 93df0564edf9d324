//! Calling workflows around the engine.
//!
//! The engine itself is pure; these workflows fetch its inputs from injected
//! collaborators and hand its results back. Nothing here holds process-wide
//! state: a repository and a market-data source are passed in by the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amortization::schedule::AmortizationRow;
use crate::comparison::market::CompetitorQuote;
use crate::types::{Money, Percent};
use crate::validation::LoanTerms;
use crate::LendingResult;

pub mod counter_offer;
pub mod memory;
pub mod origination;

pub type LoanId = u64;

/// A disbursed loan ready to be persisted together with its full schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub customer_id: String,
    pub terms: LoanTerms,
    pub installment: Money,
    pub disbursement_date: NaiveDate,
    pub rows: Vec<AmortizationRow>,
}

/// Schedule of an existing loan with its payment status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingSchedule {
    pub loan_id: LoanId,
    pub rows: Vec<AmortizationRow>,
    pub paid_sequence_numbers: Vec<u32>,
}

/// Store of credits and their installments.
pub trait LoanRepository {
    /// Monthly installments the customer is already committed to.
    fn committed_installments(&self, customer_id: &str) -> LendingResult<Money>;

    /// Schedules of the customer's loans that still have unpaid rows.
    fn outstanding_schedules(&self, customer_id: &str) -> LendingResult<Vec<OutstandingSchedule>>;

    /// Persist a loan and every row of its schedule in a single call.
    fn store_loan(&mut self, loan: NewLoan) -> LendingResult<LoanId>;
}

/// Source of the central bank rate and the competitor registry.
pub trait MarketDataSource {
    fn central_bank_rate(&self) -> LendingResult<Percent>;

    fn competitors(&self) -> LendingResult<Vec<CompetitorQuote>>;
}
