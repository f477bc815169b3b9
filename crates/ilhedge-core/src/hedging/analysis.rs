//! Simulated comparison of impermanent loss against swap hedges.

use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::payoffs::{optimal_hedge_weight, HedgeMoments, DEFAULT_HEDGE_WEIGHT};
use crate::amm::{ConstantProductPool, PoolF64};
use crate::continuous::estimator::default_num_simulations;
use crate::continuous::gbm::{lognormal_terminal_prices, seeded_rng};
use crate::error::IlHedgeError;
use crate::math::{percent, to_f64};
use crate::sweep::{evaluate_sweep, SweepAxis, SweepRange, SweepSample, SweepSeries};
use crate::types::*;
use crate::IlHedgeResult;

const MIN_SIMULATIONS: u32 = 100;

fn default_sigma() -> Rate {
    REFERENCE_SIGMA
}

/// Real-world log drift of the terminal price, ln(5/4).
fn default_log_drift() -> Rate {
    REFERENCE_SIGMA
}

fn default_fixed_weight() -> f64 {
    DEFAULT_HEDGE_WEIGHT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeInput {
    #[serde(default = "default_sigma")]
    pub sigma: Rate,
    /// mu in S_T = S0 exp(mu + sigma Z)
    #[serde(default = "default_log_drift")]
    pub log_drift: Rate,
    #[serde(default)]
    pub pool: ConstantProductPool,
    /// Weight reported alongside the optimised one.
    #[serde(default = "default_fixed_weight")]
    pub fixed_weight: f64,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for HedgeInput {
    fn default() -> Self {
        HedgeInput {
            sigma: default_sigma(),
            log_drift: default_log_drift(),
            pool: ConstantProductPool::default(),
            fixed_weight: default_fixed_weight(),
            num_simulations: default_num_simulations(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeOutput {
    pub sigma: f64,
    pub avg_impermanent_loss: f64,
    pub avg_gamma_hedged_loss: f64,
    pub avg_variance_hedged_loss: f64,
    /// At the optimal weight
    pub avg_weighted_hedged_loss: f64,
    pub avg_fixed_weight_hedged_loss: f64,
    pub optimal_weight: f64,
    pub optimal_mse: f64,
    pub gamma_mse: f64,
    pub variance_mse: f64,
    pub fixed_weight_mse: f64,
    pub unhedged_gamma: f64,
    pub unhedged_variance: f64,
    pub unhedged_weighted: f64,
    pub num_simulations: u32,
}

fn validate_input(input: &HedgeInput) -> IlHedgeResult<()> {
    if input.num_simulations < MIN_SIMULATIONS {
        return Err(IlHedgeError::invalid(
            "num_simulations",
            format!("Must be at least {MIN_SIMULATIONS}"),
        ));
    }
    if input.sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    if !(0.0..=1.0).contains(&input.fixed_weight) {
        return Err(IlHedgeError::invalid("fixed_weight", "must lie in [0, 1]"));
    }
    input.pool.validate()
}

/// Draw fresh paths from `rng` at volatility `sigma` and compare the hedges.
fn analyze_at(
    rng: &mut StdRng,
    input: &HedgeInput,
    pool: &PoolF64,
    sigma: Rate,
) -> IlHedgeResult<HedgeOutput> {
    if sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    let sigma = to_f64(sigma);
    let prices = lognormal_terminal_prices(
        rng,
        pool.s0,
        to_f64(input.log_drift),
        sigma,
        input.num_simulations as usize,
        false,
    )?;

    let moments = HedgeMoments::from_prices(pool, &prices);
    let best = optimal_hedge_weight(&moments)?;
    let avg_weighted = moments.avg_weighted_hedged_loss(best.x);
    let il = moments.avg_impermanent_loss;

    debug!(sigma, optimal_weight = best.x, mse = best.fx, "hedge weight optimised");

    Ok(HedgeOutput {
        sigma,
        avg_impermanent_loss: il,
        avg_gamma_hedged_loss: moments.avg_gamma_hedged_loss,
        avg_variance_hedged_loss: moments.avg_variance_hedged_loss,
        avg_weighted_hedged_loss: avg_weighted,
        avg_fixed_weight_hedged_loss: moments.avg_weighted_hedged_loss(input.fixed_weight),
        optimal_weight: best.x,
        optimal_mse: best.fx,
        gamma_mse: moments.mse(0.0),
        variance_mse: moments.mse(1.0),
        fixed_weight_mse: moments.mse(input.fixed_weight),
        unhedged_gamma: (il - moments.avg_gamma_hedged_loss).abs(),
        unhedged_variance: (il - moments.avg_variance_hedged_loss).abs(),
        unhedged_weighted: (il - avg_weighted).abs(),
        num_simulations: input.num_simulations,
    })
}

fn assumptions(input: &HedgeInput) -> serde_json::Value {
    serde_json::json!({
        "sigma": input.sigma.to_string(),
        "log_drift": input.log_drift.to_string(),
        "x0": input.pool.x0.to_string(),
        "y0": input.pool.y0.to_string(),
        "fixed_weight": input.fixed_weight,
        "num_simulations": input.num_simulations,
        "seed": input.seed,
    })
}

/// Compare impermanent loss with gamma, variance and weighted swap hedges at one volatility.
pub fn analyze_hedge(input: &HedgeInput) -> IlHedgeResult<ComputationOutput<HedgeOutput>> {
    let start = Instant::now();
    validate_input(input)?;
    let pool = PoolF64::from_pool(&input.pool)?;

    let mut rng = seeded_rng(input.seed);
    let output = analyze_at(&mut rng, input, &pool, input.sigma)?;

    let mut warnings = Vec::new();
    if output.optimal_weight <= 0.0 || output.optimal_weight >= 1.0 {
        warnings.push(format!(
            "Optimal hedge weight {} sits on the boundary of [0, 1]",
            output.optimal_weight
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo comparison of gamma / variance swap hedges of impermanent loss",
        &assumptions(input),
        warnings,
        elapsed,
        output,
    ))
}

/// sigma from 0.01 to 1.5, 100 points.
pub fn default_volatility_range() -> SweepRange {
    SweepRange::new("sigma", dec!(0.01), dec!(1.5), 100)
}

/// Average and unhedged losses against volatility. Every point draws fresh
/// paths from a single generator, so a seed fixes the whole series.
pub fn sweep_hedge_volatility(
    base: &HedgeInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    validate_input(base)?;
    let pool = PoolF64::from_pool(&base.pool)?;
    let mut rng = seeded_rng(base.seed);

    let series = evaluate_sweep(
        range,
        SweepAxis::new("Volatility (%)", "Loss (%)"),
        None,
        |sigma| {
            let out = analyze_at(&mut rng, base, &pool, sigma)?;
            Ok(SweepSample::new(percent(sigma, "sigma")?)
                .with("avg_impermanent_loss", out.avg_impermanent_loss)
                .with("avg_gamma_hedged_loss", out.avg_gamma_hedged_loss)
                .with("avg_variance_hedged_loss", out.avg_variance_hedged_loss)
                .with("avg_weighted_hedged_loss", out.avg_weighted_hedged_loss)
                .with("unhedged_gamma", out.unhedged_gamma)
                .with("unhedged_variance", out.unhedged_variance)
                .with("unhedged_weighted", out.unhedged_weighted)
                .with("optimal_weight", out.optimal_weight))
        },
    )?;

    let warnings = series.warnings();
    let mut assumptions = assumptions(base);
    assumptions["range"] = serde_json::to_value(range)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Impermanent loss vs. swap-hedged loss across volatility",
        &assumptions,
        warnings,
        elapsed,
        series,
    ))
}
