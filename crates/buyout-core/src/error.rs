use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which covenant test failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovenantKind {
    /// EBITDA / interest below the minimum
    Icr,
    /// Total debt / EBITDA above the maximum
    Leverage,
}

impl fmt::Display for CovenantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovenantKind::Icr => write!(f, "ICR"),
            CovenantKind::Leverage => write!(f, "Leverage"),
        }
    }
}

/// A covenant threshold violated in a simulated year.
///
/// `observed` is `Decimal::MAX` when leverage is unbounded (debt outstanding
/// against non-positive EBITDA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantBreach {
    pub kind: CovenantKind,
    pub year: u32,
    pub observed: Decimal,
    pub hurdle: Decimal,
}

impl fmt::Display for CovenantBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CovenantKind::Icr => write!(
                f,
                "year {}: ICR {:.2}x below minimum {}x",
                self.year, self.observed, self.hurdle
            ),
            CovenantKind::Leverage if self.observed == Decimal::MAX => write!(
                f,
                "year {}: leverage unbounded (non-positive EBITDA) against maximum {}x",
                self.year, self.hurdle
            ),
            CovenantKind::Leverage => write!(
                f,
                "year {}: leverage {:.2}x above maximum {}x",
                self.year, self.observed, self.hurdle
            ),
        }
    }
}

/// Mandatory debt service that could not be met even after a full revolver draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insolvency {
    pub year: u32,
    pub tranche: String,
    pub shortfall: Decimal,
}

impl fmt::Display for Insolvency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year {}: cannot meet scheduled amortisation on {} (shortfall {})",
            self.year, self.tranche, self.shortfall
        )
    }
}

#[derive(Debug, Error)]
pub enum BuyoutError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Covenant breach: {0}")]
    CovenantBreach(CovenantBreach),

    #[error("Insolvency: {0}")]
    Insolvency(Insolvency),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BuyoutError {
    /// True for errors that mean "this scenario is infeasible" rather than
    /// "this input is malformed".
    pub fn is_scenario_failure(&self) -> bool {
        matches!(
            self,
            BuyoutError::CovenantBreach(_) | BuyoutError::Insolvency(_)
        )
    }
}

impl From<CovenantBreach> for BuyoutError {
    fn from(b: CovenantBreach) -> Self {
        BuyoutError::CovenantBreach(b)
    }
}

impl From<Insolvency> for BuyoutError {
    fn from(i: Insolvency) -> Self {
        BuyoutError::Insolvency(i)
    }
}

impl From<serde_json::Error> for BuyoutError {
    fn from(e: serde_json::Error) -> Self {
        BuyoutError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_breach_message() {
        let err: BuyoutError = CovenantBreach {
            kind: CovenantKind::Icr,
            year: 2,
            observed: dec!(1.234),
            hurdle: dec!(2.0),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Covenant breach: year 2: ICR 1.23x below minimum 2.0x"
        );
        assert!(err.is_scenario_failure());
    }

    #[test]
    fn test_invalid_input_is_not_scenario_failure() {
        let err = BuyoutError::InvalidInput {
            field: "debt_pct".into(),
            reason: "must be between 0 and 1".into(),
        };
        assert!(!err.is_scenario_failure());
    }
}
