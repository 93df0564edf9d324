//! Business parameters of the engine.
//!
//! Every field has a default, so a partial JSON/YAML document only needs the
//! keys it overrides.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};
use crate::validation::ParameterLimits;
use crate::{LendingError, LendingResult};

/// Term multipliers and bounds used to derive the alternative scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioPolicy {
    /// Multiplier applied to the base term for the shortened scenario.
    pub conservative_factor: Decimal,
    /// Shortest term the conservative scenario may propose.
    pub conservative_floor_months: u32,
    /// Months removed when the multiplier lands on the base term.
    pub conservative_offset_months: u32,
    /// Multiplier applied to the base term for the extended scenario.
    pub risky_factor: Decimal,
    /// Longest term the risky scenario may propose.
    pub risky_cap_months: u32,
    /// Months added when the multiplier lands on the base term.
    pub risky_offset_months: u32,
}

impl Default for ScenarioPolicy {
    fn default() -> Self {
        Self {
            conservative_factor: dec!(0.6),
            conservative_floor_months: 6,
            conservative_offset_months: 6,
            risky_factor: dec!(1.5),
            risky_cap_months: 60,
            risky_offset_months: 12,
        }
    }
}

/// Rates applied when answering a competitor quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatePolicy {
    /// Institution's own customer-facing annual rate.
    pub standard_annual_rate_percent: Percent,
    /// Points added to the central bank rate for an aggressive counter-offer.
    pub aggressive_spread_points: Percent,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            standard_annual_rate_percent: dec!(18),
            aggressive_spread_points: dec!(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: ParameterLimits,
    /// Share of monthly income that may go to installments.
    pub max_debt_ratio_percent: Percent,
    /// Annual penalty rate charged on overdue installments.
    pub penalty_annual_rate_percent: Percent,
    pub rates: RatePolicy,
    pub scenarios: ScenarioPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ParameterLimits::default(),
            max_debt_ratio_percent: dec!(40),
            penalty_annual_rate_percent: dec!(10),
            rates: RatePolicy::default(),
            scenarios: ScenarioPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> LendingResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no calculator could honour.
    pub fn validate(&self) -> LendingResult<()> {
        let zero = Decimal::ZERO;
        let checks: [(bool, &str); 8] = [
            (
                self.max_debt_ratio_percent <= zero
                    || self.max_debt_ratio_percent > Decimal::ONE_HUNDRED,
                "max_debt_ratio_percent must be within (0, 100]",
            ),
            (
                self.penalty_annual_rate_percent < zero,
                "penalty_annual_rate_percent cannot be negative",
            ),
            (
                self.rates.standard_annual_rate_percent < zero,
                "rates.standard_annual_rate_percent cannot be negative",
            ),
            (
                self.rates.aggressive_spread_points < zero,
                "rates.aggressive_spread_points cannot be negative",
            ),
            (
                self.scenarios.conservative_factor <= zero
                    || self.scenarios.conservative_factor >= Decimal::ONE,
                "scenarios.conservative_factor must be within (0, 1)",
            ),
            (
                self.scenarios.risky_factor <= Decimal::ONE,
                "scenarios.risky_factor must be greater than 1",
            ),
            (
                self.limits.max_principal <= Money::ZERO,
                "limits.max_principal must be positive",
            ),
            (
                self.limits.max_term_months == 0,
                "limits.max_term_months must be positive",
            ),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(LendingError::Config((*reason).to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_business_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.max_debt_ratio_percent, dec!(40));
        assert_eq!(config.penalty_annual_rate_percent, dec!(10));
        assert_eq!(config.rates.aggressive_spread_points, dec!(2));
        assert_eq!(config.scenarios.risky_cap_months, 60);
        assert_eq!(config.limits.max_term_months, 360);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "max_debt_ratio_percent": "35",
            "rates": {"aggressive_spread_points": "1.5"}
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_debt_ratio_percent, dec!(35));
        assert_eq!(config.rates.aggressive_spread_points, dec!(1.5));
        assert_eq!(config.rates.standard_annual_rate_percent, dec!(18));
        assert_eq!(config.penalty_annual_rate_percent, dec!(10));
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let err = EngineConfig::from_json_str(r#"{"max_debt_ratio_percent": "140"}"#).unwrap_err();
        match err {
            LendingError::Config(reason) => assert!(reason.contains("max_debt_ratio_percent")),
            other => panic!("Expected Config, got {other:?}"),
        }
    }
}
