pub mod amm;
pub mod error;
pub mod math;
pub mod optimize;
pub mod sweep;
pub mod types;

#[cfg(feature = "binomial")]
pub mod binomial;

#[cfg(feature = "black_scholes")]
pub mod black_scholes;

#[cfg(feature = "monte_carlo")]
pub mod continuous;

#[cfg(feature = "hedging")]
pub mod hedging;

pub use error::IlHedgeError;
pub use types::*;

/// Standard result type for all ilhedge operations
pub type IlHedgeResult<T> = Result<T, IlHedgeError>;
