pub mod estimator;
pub mod gbm;
pub mod stats;

pub use crate::math::{sigma_from_up_factor, up_factor_from_sigma};
