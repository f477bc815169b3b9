use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IlHedgeError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

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

impl From<serde_json::Error> for IlHedgeError {
    fn from(e: serde_json::Error) -> Self {
        IlHedgeError::SerializationError(e.to_string())
    }
}

impl IlHedgeError {
    /// Shorthand for the most common validation failure.
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        IlHedgeError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
