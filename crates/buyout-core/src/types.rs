use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency amounts. Always `Decimal`, never f64.
pub type Money = Decimal;

/// Rates as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Multiples such as EV / EBITDA or debt / EBITDA.
pub type Multiple = Decimal;

/// Numeric basis a result was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Deterministic engines: 128-bit decimal throughout
    Decimal128,
    /// Sampled inputs drawn in f64 and converted at the engine boundary
    F64Sampling,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Decimal128 => "rust_decimal_128bit",
            Precision::F64Sampling => "ieee754_f64_sampling",
        }
    }
}

/// Envelope around every top-level result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// The request echoed back as JSON
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a result computed on `precision`.
pub fn with_precision<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    precision: Precision,
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
            precision: precision.as_str().to_string(),
        },
    }
}

/// Wrap a decimal-precision result.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    with_precision(
        methodology,
        assumptions,
        warnings,
        elapsed_us,
        Precision::Decimal128,
        result,
    )
}
