//! Terminal payoffs of the LP loss and of the swap hedges written against it.
//!
//! With reserves `x0` and initial price `S0`:
//! - impermanent loss: `x0 (sqrt(S_T) - sqrt(S0))^2`
//! - gamma-swap hedged loss: `x0 / 2 (S_T ln(S_T/S0) - (S_T - S0))`
//! - variance-swap hedged loss: `x0 (-S0/2 ln(S_T/S0) + (S_T - S0)/2)`
//!
//! All three vanish at `S_T = S0` and are convex, hence non-negative.

use crate::amm::PoolF64;
use crate::optimize::{minimize_bounded, Minimum, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use crate::IlHedgeResult;

pub const DEFAULT_HEDGE_WEIGHT: f64 = 0.6;

#[inline]
pub fn impermanent_loss(pool: &PoolF64, price: f64) -> f64 {
    pool.divergence_loss(price)
}

#[inline]
pub fn gamma_swap_hedged_loss(pool: &PoolF64, price: f64) -> f64 {
    pool.x0 * 0.5 * (price * (price / pool.s0).ln() - (price - pool.s0))
}

#[inline]
pub fn variance_swap_hedged_loss(pool: &PoolF64, price: f64) -> f64 {
    pool.x0 * (-0.5 * pool.s0 * (price / pool.s0).ln() + 0.5 * (price - pool.s0))
}

/// w * variance + (1 - w) * gamma
#[inline]
pub fn weighted_hedged_loss(pool: &PoolF64, price: f64, weight: f64) -> f64 {
    weight * variance_swap_hedged_loss(pool, price)
        + (1.0 - weight) * gamma_swap_hedged_loss(pool, price)
}

/// Mean squared error between the weighted hedge and the impermanent loss.
pub fn hedge_mse(pool: &PoolF64, weight: f64, prices: &[f64]) -> f64 {
    let n = prices.len() as f64;
    prices
        .iter()
        .map(|&s| (weighted_hedged_loss(pool, s, weight) - impermanent_loss(pool, s)).powi(2))
        .sum::<f64>()
        / n
}

/// Per-path sums that make the hedge MSE a quadratic in the weight.
///
/// With `a = variance - gamma` and `b = gamma - IL` the weighted error is
/// `w a + b`, so `mse(w) = w^2 E[a^2] + 2 w E[ab] + E[b^2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HedgeMoments {
    pub avg_impermanent_loss: f64,
    pub avg_gamma_hedged_loss: f64,
    pub avg_variance_hedged_loss: f64,
    aa: f64,
    ab: f64,
    bb: f64,
}

impl HedgeMoments {
    /// One pass over the simulated prices.
    pub fn from_prices(pool: &PoolF64, prices: &[f64]) -> Self {
        let n = prices.len() as f64;
        let mut il_sum = 0.0;
        let mut gamma_sum = 0.0;
        let mut variance_sum = 0.0;
        let mut aa = 0.0;
        let mut ab = 0.0;
        let mut bb = 0.0;

        for &s in prices {
            let il = impermanent_loss(pool, s);
            let gamma = gamma_swap_hedged_loss(pool, s);
            let variance = variance_swap_hedged_loss(pool, s);
            let a = variance - gamma;
            let b = gamma - il;
            il_sum += il;
            gamma_sum += gamma;
            variance_sum += variance;
            aa += a * a;
            ab += a * b;
            bb += b * b;
        }

        HedgeMoments {
            avg_impermanent_loss: il_sum / n,
            avg_gamma_hedged_loss: gamma_sum / n,
            avg_variance_hedged_loss: variance_sum / n,
            aa: aa / n,
            ab: ab / n,
            bb: bb / n,
        }
    }

    pub fn mse(&self, weight: f64) -> f64 {
        weight * weight * self.aa + 2.0 * weight * self.ab + self.bb
    }

    /// Average weighted hedged loss, linear in the weight.
    pub fn avg_weighted_hedged_loss(&self, weight: f64) -> f64 {
        weight * self.avg_variance_hedged_loss + (1.0 - weight) * self.avg_gamma_hedged_loss
    }
}

/// Weight in [0, 1] minimising the hedge MSE over the given paths.
pub fn optimal_hedge_weight(moments: &HedgeMoments) -> IlHedgeResult<Minimum> {
    minimize_bounded(
        |w| moments.mse(w),
        0.0,
        1.0,
        DEFAULT_TOLERANCE,
        DEFAULT_MAX_ITERATIONS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolF64 {
        PoolF64 { x0: 100.0, s0: 1.0 }
    }

    #[test]
    fn test_payoffs_vanish_at_initial_price() {
        let p = pool();
        assert_eq!(impermanent_loss(&p, 1.0), 0.0);
        assert_eq!(gamma_swap_hedged_loss(&p, 1.0), 0.0);
        assert_eq!(variance_swap_hedged_loss(&p, 1.0), 0.0);
    }

    #[test]
    fn test_payoffs_non_negative() {
        let p = pool();
        for &s in &[0.1, 0.5, 0.9, 1.1, 2.0, 5.0] {
            assert!(impermanent_loss(&p, s) >= 0.0);
            assert!(gamma_swap_hedged_loss(&p, s) >= 0.0);
            assert!(variance_swap_hedged_loss(&p, s) >= 0.0);
        }
    }

    #[test]
    fn test_known_payoff_values() {
        let p = pool();
        // S = 4: IL = 100 * (2 - 1)^2 = 100
        assert!((impermanent_loss(&p, 4.0) - 100.0).abs() < 1e-12);
        // gamma: 50 * (4 ln 4 - 3) = 50 * 2.545177444 = 127.2588722
        assert!((gamma_swap_hedged_loss(&p, 4.0) - 127.258_872_2).abs() < 1e-6);
        // variance: 100 * (-0.5 ln 4 + 1.5) = 80.68528194
        assert!((variance_swap_hedged_loss(&p, 4.0) - 80.685_281_94).abs() < 1e-6);
        // 0.6 * variance + 0.4 * gamma
        let w = weighted_hedged_loss(&p, 4.0, DEFAULT_HEDGE_WEIGHT);
        assert!((w - (0.6 * 80.685_281_94 + 0.4 * 127.258_872_2)).abs() < 1e-6);
    }

    #[test]
    fn test_moments_match_direct_mse() {
        let p = pool();
        let prices = [0.5, 0.8, 1.0, 1.3, 2.2, 3.1];
        let m = HedgeMoments::from_prices(&p, &prices);
        for &w in &[0.0, 0.25, 0.6, 1.0] {
            let direct = hedge_mse(&p, w, &prices);
            assert!((m.mse(w) - direct).abs() < 1e-9 * direct.max(1.0), "w={w}");
        }
    }

    #[test]
    fn test_optimal_weight_matches_least_squares() {
        let p = pool();
        let prices = [0.6, 0.9, 1.05, 1.2, 1.5, 1.8];
        let m = HedgeMoments::from_prices(&p, &prices);
        let best = optimal_hedge_weight(&m).unwrap();
        // Unconstrained least squares: w* = -E[ab] / E[a^2], then clamp.
        let w_star = (-m.ab / m.aa).clamp(0.0, 1.0);
        assert!((best.x - w_star).abs() < 1e-6, "best={} w*={}", best.x, w_star);
        assert!(best.fx <= m.mse(0.0) && best.fx <= m.mse(1.0));
    }
}
