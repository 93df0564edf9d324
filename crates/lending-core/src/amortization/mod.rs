//! Equal-installment (French) amortization: the fixed monthly installment
//! and the per-period schedule derived from it.

pub mod installment;
pub mod schedule;
