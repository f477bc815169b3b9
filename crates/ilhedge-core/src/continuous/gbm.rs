//! Terminal-price sampling for geometric Brownian motion.
//!
//! Under GBM the terminal price has the exact solution
//! `S_T = S0 * exp((r - sigma^2 / 2) T + sigma sqrt(T) Z)` with `Z ~ N(0, 1)`,
//! so a single step per path is enough.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::IlHedgeError;
use crate::math::require_finite;
use crate::IlHedgeResult;

/// Seeded when a seed is given, otherwise drawn from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// The given seed, or a fresh random one. Sweeps resolve their seed once so
/// every point sees the same draws.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random::<u64>)
}

/// `n` standard normal draws. With `antithetic`, draws come in `(z, -z)`
/// pairs and `n` must be even.
pub fn standard_normal_draws(
    rng: &mut StdRng,
    n: usize,
    antithetic: bool,
) -> IlHedgeResult<Vec<f64>> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| {
        IlHedgeError::invalid("distribution", format!("Invalid Normal parameters: {e}"))
    })?;

    if antithetic {
        if n % 2 != 0 {
            return Err(IlHedgeError::invalid(
                "num_simulations",
                "must be even when antithetic variates are enabled",
            ));
        }
        let mut draws = Vec::with_capacity(n);
        for _ in 0..n / 2 {
            let z: f64 = rng.sample(normal);
            draws.push(z);
            draws.push(-z);
        }
        Ok(draws)
    } else {
        Ok((0..n).map(|_| rng.sample(normal)).collect())
    }
}

/// `S0 * exp(log_mean + log_sd * Z)` for each draw.
pub fn lognormal_terminal_prices(
    rng: &mut StdRng,
    s0: f64,
    log_mean: f64,
    log_sd: f64,
    n: usize,
    antithetic: bool,
) -> IlHedgeResult<Vec<f64>> {
    require_finite(s0, "s0")?;
    require_finite(log_mean, "log_mean")?;
    require_finite(log_sd, "log_sd")?;
    if s0 <= 0.0 {
        return Err(IlHedgeError::invalid("s0", "must be positive"));
    }
    if log_sd < 0.0 {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }

    let draws = standard_normal_draws(rng, n, antithetic)?;
    debug!(paths = n, antithetic, "sampled terminal prices");
    Ok(draws
        .into_iter()
        .map(|z| s0 * (log_mean + log_sd * z).exp())
        .collect())
}

/// Parameters of a risk-neutral GBM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmParams {
    pub s0: f64,
    pub rate: f64,
    pub sigma: f64,
    pub maturity: f64,
}

/// S_T = S0 exp((r - sigma^2/2) T + sigma sqrt(T) Z), one step of length T.
pub fn simulate_terminal_prices(
    rng: &mut StdRng,
    params: &GbmParams,
    n: usize,
    antithetic: bool,
) -> IlHedgeResult<Vec<f64>> {
    require_finite(params.rate, "risk_free_rate")?;
    require_finite(params.maturity, "maturity")?;
    if params.maturity <= 0.0 {
        return Err(IlHedgeError::invalid("maturity", "must be positive"));
    }
    let drift = (params.rate - 0.5 * params.sigma * params.sigma) * params.maturity;
    let diffusion = params.sigma * params.maturity.sqrt();
    lognormal_terminal_prices(rng, params.s0, drift, diffusion, n, antithetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn params(sigma: f64, rate: f64) -> GbmParams {
        GbmParams {
            s0: 1.0,
            rate,
            sigma,
            maturity: 1.0,
        }
    }

    #[test]
    fn test_seeded_reproducibility() {
        let a = simulate_terminal_prices(&mut seeded_rng(Some(SEED)), &params(0.3, 0.0), 1_000, false)
            .unwrap();
        let b = simulate_terminal_prices(&mut seeded_rng(Some(SEED)), &params(0.3, 0.0), 1_000, false)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_martingale_under_risk_neutral_drift() {
        // E[S_T] = S0 e^{rT}
        let prices =
            simulate_terminal_prices(&mut seeded_rng(Some(SEED)), &params(0.2, 0.05), 200_000, false)
                .unwrap();
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        assert!((mean - 0.05_f64.exp()).abs() < 0.005, "mean={mean}");
        assert!(prices.iter().all(|p| *p > 0.0));
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let prices =
            simulate_terminal_prices(&mut seeded_rng(Some(SEED)), &params(0.0, 0.1), 10, false)
                .unwrap();
        assert!(prices.iter().all(|p| (*p - 0.1_f64.exp()).abs() < 1e-15));
    }

    #[test]
    fn test_antithetic_pairs() {
        let draws = standard_normal_draws(&mut seeded_rng(Some(SEED)), 10, true).unwrap();
        for pair in draws.chunks(2) {
            assert_eq!(pair[0], -pair[1]);
        }
        assert!(standard_normal_draws(&mut seeded_rng(Some(SEED)), 11, true).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = seeded_rng(Some(SEED));
        assert!(lognormal_terminal_prices(&mut rng, 0.0, 0.0, 0.2, 10, false).is_err());
        assert!(lognormal_terminal_prices(&mut rng, 1.0, 0.0, -0.2, 10, false).is_err());
        assert!(lognormal_terminal_prices(&mut rng, 1.0, f64::NAN, 0.2, 10, false).is_err());
        let bad_t = GbmParams {
            maturity: 0.0,
            ..params(0.2, 0.0)
        };
        assert!(simulate_terminal_prices(&mut rng, &bad_t, 10, false).is_err());
    }
}
