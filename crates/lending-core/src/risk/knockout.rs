//! Knock-out rules for a credit application.
//!
//! Every rule is evaluated and every failing rule is reported, so the
//! rejection shown to the applicant carries the full numeric breakdown.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::installment::installment_for;
use crate::config::EngineConfig;
use crate::error::ParameterViolation;
use crate::risk::affordability::{assess_affordability, AffordabilityVerdict};
use crate::risk::arrears::ArrearsReport;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{validate_with_limits, LoanTerms};
use crate::LendingResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditApplication {
    pub customer_id: String,
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    pub monthly_income: Money,
    /// Defaults to the day the application is processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum KnockoutReason {
    InvalidParameters {
        violations: Vec<ParameterViolation>,
    },
    NoVerifiableIncome,
    InsufficientCapacity {
        proposed_installment: Money,
        available_capacity: Money,
        shortfall: Money,
    },
    ExistingArrears {
        overdue_count: usize,
        total_due: Money,
        max_days_late: u32,
    },
}

impl KnockoutReason {
    /// Message shown to the applicant.
    pub fn message(&self) -> String {
        match self {
            KnockoutReason::InvalidParameters { violations } => violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
            KnockoutReason::NoVerifiableIncome => {
                "Monthly income must be greater than zero.".into()
            }
            KnockoutReason::InsufficientCapacity {
                proposed_installment,
                available_capacity,
                shortfall,
            } => format!(
                "Installment {proposed_installment} exceeds available capacity \
                 {available_capacity} by {shortfall}."
            ),
            KnockoutReason::ExistingArrears {
                overdue_count,
                total_due,
                max_days_late,
            } => format!(
                "{overdue_count} overdue installments totalling {total_due}, \
                 up to {max_days_late} days late."
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnockoutDecision {
    pub approved: bool,
    pub reasons: Vec<KnockoutReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<AffordabilityVerdict>,
}

/// Run every knock-out rule against an application.
///
/// `existing_committed` is what the applicant already pays per month and
/// `existing_arrears` the state of their current loans, both supplied by the
/// caller's store.
pub fn evaluate_application(
    application: &CreditApplication,
    existing_committed: Money,
    existing_arrears: Option<&ArrearsReport>,
    config: &EngineConfig,
) -> LendingResult<KnockoutDecision> {
    let mut reasons = Vec::new();

    let violations = validate_with_limits(
        application.principal,
        application.annual_rate_percent,
        i64::from(application.term_months),
        &config.limits,
    );
    if !violations.is_empty() {
        reasons.push(KnockoutReason::InvalidParameters { violations });
    }

    let income_ok = application.monthly_income > Decimal::ZERO;
    if !income_ok {
        reasons.push(KnockoutReason::NoVerifiableIncome);
    }

    let mut installment = None;
    let mut verdict = None;
    if reasons.is_empty() {
        let terms = LoanTerms::with_limits(
            application.principal,
            application.annual_rate_percent,
            application.term_months,
            &config.limits,
        )?;
        let amount = installment_for(&terms)?;
        let v = assess_affordability(
            amount,
            application.monthly_income,
            existing_committed,
            config.max_debt_ratio_percent,
        )?;
        if !v.approved {
            reasons.push(KnockoutReason::InsufficientCapacity {
                proposed_installment: v.proposed_installment,
                available_capacity: v.available_capacity,
                shortfall: v.shortfall,
            });
        }
        installment = Some(amount);
        verdict = Some(v);
    }

    if let Some(report) = existing_arrears {
        if !report.lines.is_empty() {
            reasons.push(KnockoutReason::ExistingArrears {
                overdue_count: report.lines.len(),
                total_due: report.total_due,
                max_days_late: report.max_days_late,
            });
        }
    }

    let decision = KnockoutDecision {
        approved: reasons.is_empty(),
        reasons,
        installment,
        verdict,
    };
    if decision.approved {
        log::debug!("application from {} passes every rule", application.customer_id);
    } else {
        log::warn!(
            "application from {} knocked out by {} rule(s)",
            application.customer_id,
            decision.reasons.len()
        );
    }
    Ok(decision)
}

/// An application together with what the caller's store knows about the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub application: CreditApplication,
    #[serde(default)]
    pub existing_committed_installments: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_arrears: Option<ArrearsReport>,
}

/// Knock-out decision wrapped in the standard output envelope.
pub fn calculate_evaluation(
    input: &EvaluationInput,
    config: &EngineConfig,
) -> LendingResult<ComputationOutput<KnockoutDecision>> {
    let start = Instant::now();
    let decision = evaluate_application(
        &input.application,
        input.existing_committed_installments,
        input.existing_arrears.as_ref(),
        config,
    )?;

    let warnings: Vec<String> = decision.reasons.iter().map(KnockoutReason::message).collect();
    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "max_debt_ratio_percent": config.max_debt_ratio_percent.to_string(),
        "existing_committed_installments": input.existing_committed_installments.to_string(),
    });

    Ok(with_metadata(
        "Knock-out rules: parameters, income, debt-to-income capacity, existing arrears",
        &assumptions,
        warnings,
        elapsed,
        decision,
    ))
}
