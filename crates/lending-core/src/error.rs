use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated precondition on an engine input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterViolation {
    pub field: String,
    pub reason: String,
}

impl ParameterViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Invalid parameters: {}", join_violations(.0))]
    InvalidParameters(Vec<ParameterViolation>),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LendingError {
    /// Shorthand for a failure with exactly one violated constraint.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LendingError::InvalidParameters(vec![ParameterViolation::new(field, reason)])
    }

    /// The violated constraints, empty for every non-parameter error.
    pub fn violations(&self) -> &[ParameterViolation] {
        match self {
            LendingError::InvalidParameters(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[ParameterViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for LendingError {
    fn from(e: serde_json::Error) -> Self {
        LendingError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_violation() {
        let err = LendingError::InvalidParameters(vec![
            ParameterViolation::new("principal", "must be positive"),
            ParameterViolation::new("term_months", "must not exceed 360"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid parameters: principal: must be positive; term_months: must not exceed 360"
        );
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_non_parameter_errors_have_no_violations() {
        let err = LendingError::Repository("connection refused".into());
        assert!(err.violations().is_empty());
    }
}
