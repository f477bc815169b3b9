//! Monte Carlo value of the LP divergence payoff under risk-neutral GBM.
//!
//! `H0 = 100 * e^{-rT} * E[(sqrt(S_T) - sqrt(S0))^2]`: the percentage fee
//! return an LP must earn to cover the expected discounted divergence loss.
//! Every estimate is reported next to its closed form.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::gbm::{resolve_seed, seeded_rng, simulate_terminal_prices, GbmParams};
use super::stats::summarize;
use crate::amm::ConstantProductPool;
use crate::black_scholes::hedge_cost::expected_discounted_divergence_f64;
use crate::error::IlHedgeError;
use crate::math::{percent, to_f64};
use crate::sweep::{evaluate_sweep, ReferenceMarker, SweepAxis, SweepRange, SweepSample, SweepSeries};
use crate::types::*;
use crate::IlHedgeResult;

const PERCENT: f64 = 100.0;
const MIN_SIMULATIONS: u32 = 100;

fn default_sigma() -> Rate {
    REFERENCE_SIGMA
}

fn default_maturity() -> Years {
    Decimal::ONE
}

pub(crate) fn default_num_simulations() -> u32 {
    1_000_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousInput {
    #[serde(default)]
    pub risk_free_rate: Rate,
    #[serde(default = "default_sigma")]
    pub sigma: Rate,
    #[serde(default = "default_maturity")]
    pub maturity: Years,
    #[serde(default)]
    pub pool: ConstantProductPool,
    /// Number of simulation paths (minimum 100).
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pair every normal draw with its negation.
    #[serde(default)]
    pub antithetic: bool,
}

impl Default for ContinuousInput {
    fn default() -> Self {
        ContinuousInput {
            risk_free_rate: Decimal::ZERO,
            sigma: default_sigma(),
            maturity: default_maturity(),
            pool: ConstantProductPool::default(),
            num_simulations: default_num_simulations(),
            seed: None,
            antithetic: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousOutput {
    /// 100 * e^{-rT} * mean((sqrt(S_T) - sqrt(S0))^2)
    pub h0: f64,
    pub std_error: f64,
    /// 95% confidence interval
    pub confidence_interval: (f64, f64),
    /// Closed-form value of the same expectation
    pub analytic_h0: f64,
    pub abs_error: f64,
    pub sigma: f64,
    pub risk_free_rate: f64,
    pub num_simulations: u32,
}

fn validate_input(input: &ContinuousInput) -> IlHedgeResult<()> {
    if input.num_simulations < MIN_SIMULATIONS {
        return Err(IlHedgeError::invalid(
            "num_simulations",
            format!("Must be at least {MIN_SIMULATIONS}"),
        ));
    }
    if input.sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    if input.maturity <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("maturity", "must be positive"));
    }
    input.pool.validate()
}

/// Core estimator shared by the single-point API and the sweeps.
fn run_estimate(
    input: &ContinuousInput,
    rate: Rate,
    sigma: Rate,
    seed: Option<u64>,
) -> IlHedgeResult<ContinuousOutput> {
    if sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    let s0 = to_f64(input.pool.initial_price()?);
    let params = GbmParams {
        s0,
        rate: to_f64(rate),
        sigma: to_f64(sigma),
        maturity: to_f64(input.maturity),
    };

    let mut rng = seeded_rng(seed);
    let prices = simulate_terminal_prices(
        &mut rng,
        &params,
        input.num_simulations as usize,
        input.antithetic,
    )?;

    let discount = (-params.rate * params.maturity).exp();
    let root_s0 = s0.sqrt();
    let payoffs: Vec<f64> = prices
        .iter()
        .map(|s| PERCENT * discount * (s.sqrt() - root_s0).powi(2))
        .collect();
    let estimate = summarize(&payoffs, input.antithetic)?;

    let analytic_h0 = PERCENT
        * expected_discounted_divergence_f64(s0, params.rate, params.sigma, params.maturity);

    debug!(
        rate = params.rate,
        sigma = params.sigma,
        h0 = estimate.mean,
        analytic_h0,
        "divergence payoff estimated"
    );

    Ok(ContinuousOutput {
        h0: estimate.mean,
        std_error: estimate.std_error,
        confidence_interval: (estimate.ci_lower, estimate.ci_upper),
        analytic_h0,
        abs_error: (estimate.mean - analytic_h0).abs(),
        sigma: params.sigma,
        risk_free_rate: params.rate,
        num_simulations: input.num_simulations,
    })
}

/// Estimate H0 at the input's rate and volatility.
pub fn estimate_h0(input: &ContinuousInput) -> IlHedgeResult<ComputationOutput<ContinuousOutput>> {
    let start = Instant::now();
    validate_input(input)?;

    let output = run_estimate(input, input.risk_free_rate, input.sigma, input.seed)?;

    let mut warnings = Vec::new();
    if output.abs_error > 4.0 * output.std_error && output.std_error > 0.0 {
        warnings.push(format!(
            "Estimate deviates from the closed form by {:.2} standard errors",
            output.abs_error / output.std_error
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo GBM valuation of LP divergence loss",
        &serde_json::json!({
            "risk_free_rate": input.risk_free_rate.to_string(),
            "sigma": input.sigma.to_string(),
            "maturity": input.maturity.to_string(),
            "x0": input.pool.x0.to_string(),
            "y0": input.pool.y0.to_string(),
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "antithetic": input.antithetic,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// r from 0% to 20%, 21 points.
pub fn default_rate_range() -> SweepRange {
    SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.20), 21)
}

/// sigma from 0 to 0.7, 71 points.
pub fn default_volatility_range() -> SweepRange {
    SweepRange::new("sigma", Decimal::ZERO, dec!(0.7), 71)
}

fn sample_from(out: &ContinuousOutput, x: Decimal) -> SweepSample {
    SweepSample::new(x)
        .with("h0", out.h0)
        .with("std_error", out.std_error)
        .with("analytic_h0", out.analytic_h0)
}

fn sweep_assumptions(input: &ContinuousInput, range: &SweepRange, seed: u64) -> serde_json::Value {
    serde_json::json!({
        "risk_free_rate": input.risk_free_rate.to_string(),
        "sigma": input.sigma.to_string(),
        "maturity": input.maturity.to_string(),
        "num_simulations": input.num_simulations,
        "seed": seed,
        "antithetic": input.antithetic,
        "range": range,
    })
}

/// H0 against the risk-free rate at the base volatility.
pub fn sweep_continuous_rate(
    base: &ContinuousInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    validate_input(base)?;
    let seed = resolve_seed(base.seed);

    let reference = ReferenceMarker {
        x: percent(base.risk_free_rate, "risk_free_rate")?,
        label: format!("Reference r value ({})", base.risk_free_rate),
    };
    let series = evaluate_sweep(
        range,
        SweepAxis::new("Risk Free Interest Rate (%)", "Returns (%) from Fees needed to Break Even"),
        Some(reference),
        |r| {
            let out = run_estimate(base, r, base.sigma, Some(seed))?;
            Ok(sample_from(&out, percent(r, "risk_free_rate")?))
        },
    )?;

    let warnings = series.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo H0 vs. risk-free rate",
        &sweep_assumptions(base, range, seed),
        warnings,
        elapsed,
        series,
    ))
}

/// H0 against volatility at the base rate.
pub fn sweep_continuous_volatility(
    base: &ContinuousInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    validate_input(base)?;
    let seed = resolve_seed(base.seed);

    let reference = ReferenceMarker {
        x: percent(base.sigma, "sigma")?,
        label: format!("Reference sigma value ({:.4})", base.sigma),
    };
    let series = evaluate_sweep(
        range,
        SweepAxis::new("Implied Volatility % (sigma)", "Returns (%) from Fees needed to Break Even"),
        Some(reference),
        |sigma| {
            let out = run_estimate(base, base.risk_free_rate, sigma, Some(seed))?;
            Ok(sample_from(&out, percent(sigma, "sigma")?))
        },
    )?;

    let warnings = series.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo H0 vs. volatility",
        &sweep_assumptions(base, range, seed),
        warnings,
        elapsed,
        series,
    ))
}
