//! Precondition gate for every loan calculation.
//!
//! Rules are checked independently and every violation is reported, so a
//! caller can show the borrower all problems with a simulation at once.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ParameterViolation;
use crate::types::{Money, Percent};
use crate::{LendingError, LendingResult};

/// Upper bounds on loan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterLimits {
    pub max_principal: Money,
    pub max_annual_rate_percent: Percent,
    pub max_term_months: u32,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            max_principal: dec!(100_000_000),
            max_annual_rate_percent: dec!(50),
            max_term_months: 360,
        }
    }
}

/// Collect every violated constraint on (principal, rate, term). Empty means
/// the parameters are valid.
pub fn validate_loan_parameters(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: i64,
) -> Vec<ParameterViolation> {
    validate_with_limits(
        principal,
        annual_rate_percent,
        term_months,
        &ParameterLimits::default(),
    )
}

pub fn validate_with_limits(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: i64,
    limits: &ParameterLimits,
) -> Vec<ParameterViolation> {
    let mut violations = Vec::new();

    if principal <= Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "principal",
            "Principal must be greater than zero.",
        ));
    } else if principal > limits.max_principal {
        violations.push(ParameterViolation::new(
            "principal",
            format!("Principal cannot exceed {}.", limits.max_principal),
        ));
    }

    if annual_rate_percent < Decimal::ZERO {
        violations.push(ParameterViolation::new(
            "annual_rate_percent",
            "Annual rate cannot be negative.",
        ));
    } else if annual_rate_percent > limits.max_annual_rate_percent {
        violations.push(ParameterViolation::new(
            "annual_rate_percent",
            format!(
                "Annual rate cannot exceed {}%.",
                limits.max_annual_rate_percent
            ),
        ));
    }

    if term_months <= 0 {
        violations.push(ParameterViolation::new(
            "term_months",
            "Term must be at least one month.",
        ));
    } else if term_months > i64::from(limits.max_term_months) {
        violations.push(ParameterViolation::new(
            "term_months",
            format!("Term cannot exceed {} months.", limits.max_term_months),
        ));
    }

    violations
}

/// Principal, annual rate and term of a loan, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LoanTerms {
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
}

impl LoanTerms {
    pub fn new(
        principal: Money,
        annual_rate_percent: Percent,
        term_months: u32,
    ) -> LendingResult<Self> {
        Self::with_limits(
            principal,
            annual_rate_percent,
            term_months,
            &ParameterLimits::default(),
        )
    }

    pub fn with_limits(
        principal: Money,
        annual_rate_percent: Percent,
        term_months: u32,
        limits: &ParameterLimits,
    ) -> LendingResult<Self> {
        let violations = validate_with_limits(
            principal,
            annual_rate_percent,
            i64::from(term_months),
            limits,
        );
        if !violations.is_empty() {
            return Err(LendingError::InvalidParameters(violations));
        }
        Ok(Self {
            principal,
            annual_rate_percent,
            term_months,
        })
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> Percent {
        self.annual_rate_percent
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }
}

/// Deserialise through the validator so untrusted payloads never yield
/// unchecked terms.
impl<'de> Deserialize<'de> for LoanTerms {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            principal: Money,
            annual_rate_percent: Percent,
            term_months: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        LoanTerms::new(raw.principal, raw.annual_rate_percent, raw.term_months)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(violations: &[ParameterViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_parameters_yield_no_violations() {
        assert!(validate_loan_parameters(dec!(5_000_000), dec!(18), 24).is_empty());
        assert!(validate_loan_parameters(dec!(100_000_000), dec!(50), 360).is_empty());
        assert!(validate_loan_parameters(dec!(0.01), Decimal::ZERO, 1).is_empty());
    }

    #[test]
    fn test_principal_ceiling() {
        let violations = validate_loan_parameters(dec!(150_000_000), dec!(10), 12);
        assert_eq!(fields(&violations), vec!["principal"]);
        assert!(violations[0].reason.contains("100000000"));
    }

    #[test]
    fn test_all_violations_collected() {
        let violations = validate_loan_parameters(dec!(-1), dec!(51), 0);
        assert_eq!(
            fields(&violations),
            vec!["principal", "annual_rate_percent", "term_months"]
        );
    }

    #[test]
    fn test_term_bounds() {
        let violations = validate_loan_parameters(dec!(1000), dec!(5), 361);
        assert_eq!(fields(&violations), vec!["term_months"]);
        assert_eq!(fields(&validate_loan_parameters(dec!(1000), dec!(5), -3)), vec!["term_months"]);
    }

    #[test]
    fn test_negative_rate() {
        let violations = validate_loan_parameters(dec!(1000), dec!(-0.5), 12);
        assert_eq!(fields(&violations), vec!["annual_rate_percent"]);
    }

    #[test]
    fn test_loan_terms_constructor_carries_full_list() {
        let err = LoanTerms::new(Decimal::ZERO, dec!(60), 12).unwrap_err();
        assert_eq!(fields(err.violations()), vec!["principal", "annual_rate_percent"]);
    }

    #[test]
    fn test_custom_limits() {
        let limits = ParameterLimits {
            max_principal: dec!(10_000),
            max_annual_rate_percent: dec!(30),
            max_term_months: 48,
        };
        let err = LoanTerms::with_limits(dec!(20_000), dec!(35), 60, &limits).unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"principal": 1000, "annual_rate_percent": 12, "term_months": 12}"#;
        let ok: LoanTerms = serde_json::from_str(json).unwrap();
        assert_eq!(ok.term_months(), 12);

        let bad = serde_json::from_str::<LoanTerms>(
            r#"{"principal": 1000, "annual_rate_percent": 12, "term_months": 0}"#,
        );
        assert!(bad.is_err());
    }
}
