pub mod amortization;
pub mod config;
pub mod error;
pub mod types;
pub mod validation;
pub mod wire;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "workflow")]
pub mod workflow;

pub use error::{LendingError, ParameterViolation};
pub use types::*;

/// Standard result type for all lending-engine operations
pub type LendingResult<T> = Result<T, LendingError>;
