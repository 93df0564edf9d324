//! Credit risk rules: arrears penalties, capacity to pay and the knock-out
//! checks applied to a credit application.

pub mod affordability;
pub mod arrears;
pub mod knockout;
