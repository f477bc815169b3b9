use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reserve amounts and portfolio values.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions
pub type Years = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Numeric representation a computation was carried out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Decimal,
    Float,
}

impl Precision {
    fn label(self) -> &'static str {
        match self {
            Precision::Decimal => "rust_decimal_128bit",
            Precision::Float => "ieee754_f64",
        }
    }
}

/// Helper to wrap closed-form (Decimal) results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    wrap(Precision::Decimal, methodology, assumptions, warnings, elapsed_us, result)
}

/// Helper to wrap simulated (f64) results with metadata
pub fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    wrap(Precision::Float, methodology, assumptions, warnings, elapsed_us, result)
}

fn wrap<T: Serialize>(
    precision: Precision,
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: precision.label().to_string(),
        },
    }
}

/// Up-move factor of the reference analysis.
pub const REFERENCE_UP_FACTOR: Decimal = rust_decimal_macros::dec!(1.25);

/// ln(1.25): the volatility implied by the reference up factor over one year.
pub const REFERENCE_SIGMA: Decimal = rust_decimal_macros::dec!(0.2231435513142097557662950903);
