pub mod comparison;
pub mod loan;
pub mod risk;
pub mod workflow;
