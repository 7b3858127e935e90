pub mod error;
pub mod numeric;
pub mod time_value;
pub mod types;

#[cfg(feature = "lbo")]
pub mod lbo;

#[cfg(feature = "waterfall")]
pub mod waterfall;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::BuyoutError;
pub use types::*;

/// Standard result type for all buyout operations
pub type BuyoutResult<T> = Result<T, BuyoutError>;
