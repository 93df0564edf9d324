//! JSON records exchanged with the existing web client.
//!
//! Field names are the ones the client already sends and reads, and amounts
//! go out as JSON numbers rather than strings.

use serde::{Deserialize, Serialize};

use crate::amortization::installment::summarize_loan;
use crate::types::{Money, Percent};
use crate::validation::{validate_with_limits, LoanTerms, ParameterLimits};
use crate::{LendingError, LendingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub monto: Money,
    pub tasa_interes: Percent,
    /// Signed so a negative term from the client is reported, not a parse error.
    pub plazo_meses: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub cuota_mensual: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_pagar: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub interes_total: Money,
}

/// Error body for a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub mensaje: String,
    pub errores: Vec<String>,
}

impl From<&LendingError> for ErrorResponse {
    fn from(err: &LendingError) -> Self {
        let errores = err.violations().iter().map(|v| v.reason.clone()).collect();
        ErrorResponse {
            mensaje: err.to_string(),
            errores,
        }
    }
}

/// Validate a client simulation request and compute its installment totals.
pub fn simulate(
    request: &SimulationRequest,
    limits: &ParameterLimits,
) -> LendingResult<SimulationResponse> {
    let violations = validate_with_limits(
        request.monto,
        request.tasa_interes,
        request.plazo_meses,
        limits,
    );
    if !violations.is_empty() {
        return Err(LendingError::InvalidParameters(violations));
    }
    let term = u32::try_from(request.plazo_meses)
        .map_err(|_| LendingError::invalid("term_months", "Term is out of range."))?;
    let terms = LoanTerms::with_limits(request.monto, request.tasa_interes, term, limits)?;
    let summary = summarize_loan(&terms)?;

    Ok(SimulationResponse {
        cuota_mensual: summary.installment,
        total_pagar: summary.total_payment,
        interes_total: summary.total_interest,
    })
}
