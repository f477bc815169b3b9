use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::IlHedgeError;
use crate::IlHedgeResult;

const CONFIDENCE_LEVEL: f64 = 0.95;

/// Monte Carlo estimate with its sampling error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McEstimate {
    pub mean: f64,
    pub std_dev: f64,
    pub std_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summarise i.i.d. samples. With `antithetic`, consecutive pairs are
/// averaged first so the standard error reflects the pairing.
pub fn summarize(values: &[f64], antithetic: bool) -> IlHedgeResult<McEstimate> {
    if values.len() < 2 {
        return Err(IlHedgeError::InsufficientData(
            "At least two samples are required".into(),
        ));
    }

    let paired: Vec<f64>;
    let samples = if antithetic {
        paired = values.chunks(2).map(mean).collect();
        &paired[..]
    } else {
        values
    };

    let n = samples.len() as f64;
    let m = mean(samples);
    // Sample (n - 1) variance
    let variance = samples.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
    let std_dev = variance.sqrt();
    let std_error = std_dev / n.sqrt();

    let z = Normal::new(0.0, 1.0)
        .map_err(|e| IlHedgeError::invalid("distribution", format!("{e}")))?
        .inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);

    Ok(McEstimate {
        mean: m,
        std_dev,
        std_error,
        ci_lower: m - z * std_error,
        ci_upper: m + z * std_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_known_values() {
        let est = summarize(&[1.0, 2.0, 3.0, 4.0], false).unwrap();
        assert!((est.mean - 2.5).abs() < 1e-15);
        // sample variance = 5/3
        assert!((est.std_dev - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((est.std_error - est.std_dev / 2.0).abs() < 1e-12);
        // z_0.975 = 1.959964
        assert!((est.ci_upper - est.mean - 1.959964 * est.std_error).abs() < 1e-5);
    }

    #[test]
    fn test_antithetic_pairs_are_averaged() {
        // Pair means are 1.5 and 3.5
        let est = summarize(&[1.0, 2.0, 3.0, 4.0], true).unwrap();
        assert!((est.mean - 2.5).abs() < 1e-15);
        assert!((est.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_samples_have_zero_error() {
        let est = summarize(&[0.0; 10], false).unwrap();
        assert_eq!(est.std_error, 0.0);
        assert_eq!(est.ci_lower, est.ci_upper);
    }

    #[test]
    fn test_too_few_samples() {
        assert!(summarize(&[1.0], false).is_err());
    }
}
