//! Alternative repayment scenarios and competitor counter-offers.

pub mod market;
pub mod scenarios;
