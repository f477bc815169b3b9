//! Continuous-time closed forms for the cost of hedging an LP position.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amm::ConstantProductPool;
use crate::error::IlHedgeError;
use crate::math::{checked_div, checked_mul, exp_decimal, percent, to_f64};
use crate::sweep::{evaluate_sweep, ReferenceMarker, SweepAxis, SweepRange, SweepSample, SweepSeries};
use crate::types::*;
use crate::IlHedgeResult;

fn default_sigma() -> Rate {
    REFERENCE_SIGMA
}

fn default_maturity() -> Years {
    Decimal::ONE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackScholesInput {
    #[serde(default = "default_sigma")]
    pub sigma: Rate,
    #[serde(default = "default_maturity")]
    pub maturity: Years,
    /// Only enters the discounted expected divergence.
    #[serde(default)]
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub pool: ConstantProductPool,
}

impl Default for BlackScholesInput {
    fn default() -> Self {
        BlackScholesInput {
            sigma: default_sigma(),
            maturity: default_maturity(),
            risk_free_rate: Decimal::ZERO,
            pool: ConstantProductPool::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackScholesOutput {
    pub sigma: Rate,
    pub maturity: Years,
    /// 2 * y0 * (1 - exp(-sigma^2 T / 8))
    pub hedge_cost: Money,
    /// hedge_cost as a percentage of V_LP(0)
    pub hedge_cost_pct_of_lp: Decimal,
    /// 100 * e^{-rT} E[(sqrt(S_T) - sqrt(S0))^2]
    pub expected_divergence_pct: Decimal,
    pub lp_value_initial: Money,
}

fn validate_sigma_maturity(sigma: Rate, maturity: Years) -> IlHedgeResult<()> {
    if sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    if maturity <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("maturity", "must be positive"));
    }
    Ok(())
}

/// sigma^2 * T, checked.
fn total_variance(sigma: Rate, maturity: Years) -> IlHedgeResult<Decimal> {
    checked_mul(checked_mul(sigma, sigma, "sigma")?, maturity, "maturity")
}

/// Cost of dynamically hedging the LP position: 2 * y0 * (1 - exp(-sigma^2 T / 8)).
pub fn lp_hedge_cost(y0: Money, sigma: Rate, maturity: Years) -> IlHedgeResult<Money> {
    validate_sigma_maturity(sigma, maturity)?;
    if y0 <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("y0", "reserve must be positive"));
    }
    let decay = exp_decimal(-total_variance(sigma, maturity)? / dec!(8), "sigma")?;
    checked_mul(checked_mul(dec!(2), y0, "y0")?, Decimal::ONE - decay, "y0")
}

/// e^{-rT} E[(sqrt(S_T) - sqrt(S0))^2] when S follows GBM with drift r:
/// S0 * (1 - 2 e^{-rT/2 - sigma^2 T/8} + e^{-rT}).
pub fn expected_discounted_divergence(
    s0: Decimal,
    r: Rate,
    sigma: Rate,
    maturity: Years,
) -> IlHedgeResult<Decimal> {
    validate_sigma_maturity(sigma, maturity)?;
    if s0 <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("s0", "must be positive"));
    }
    let rate_time = checked_mul(r, maturity, "risk_free_rate")?;
    let cross = exp_decimal(
        -rate_time / dec!(2) - total_variance(sigma, maturity)? / dec!(8),
        "risk_free_rate",
    )?;
    let discount = exp_decimal(-rate_time, "risk_free_rate")?;
    checked_mul(s0, Decimal::ONE - dec!(2) * cross + discount, "s0")
}

/// f64 twin of [`expected_discounted_divergence`] for checking simulations.
pub fn expected_discounted_divergence_f64(s0: f64, r: f64, sigma: f64, maturity: f64) -> f64 {
    let cross = (-r * maturity / 2.0 - sigma * sigma * maturity / 8.0).exp();
    s0 * (1.0 - 2.0 * cross + (-r * maturity).exp())
}

pub fn value_black_scholes(
    input: &BlackScholesInput,
) -> IlHedgeResult<ComputationOutput<BlackScholesOutput>> {
    let start = Instant::now();
    input.pool.validate()?;
    validate_sigma_maturity(input.sigma, input.maturity)?;

    let hedge_cost = lp_hedge_cost(input.pool.y0, input.sigma, input.maturity)?;
    let s0 = input.pool.initial_price()?;
    let lp_value_initial = input.pool.lp_value(s0)?;
    let expected = expected_discounted_divergence(
        s0,
        input.risk_free_rate,
        input.sigma,
        input.maturity,
    )?;

    let mut warnings = Vec::new();
    if input.sigma > dec!(2) {
        warnings.push(format!(
            "Volatility {} is outside the range the model was calibrated for",
            input.sigma
        ));
    }

    let output = BlackScholesOutput {
        sigma: input.sigma,
        maturity: input.maturity,
        hedge_cost,
        hedge_cost_pct_of_lp: percent(checked_div(hedge_cost, lp_value_initial, "lp_value")?, "lp_value")?,
        expected_divergence_pct: percent(expected, "s0")?,
        lp_value_initial,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Black-Scholes dynamic hedge of LP divergence loss (closed form)",
        &serde_json::json!({
            "sigma": input.sigma.to_string(),
            "maturity": input.maturity.to_string(),
            "risk_free_rate": input.risk_free_rate.to_string(),
            "x0": input.pool.x0.to_string(),
            "y0": input.pool.y0.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// sigma from 0 to 0.7, 500 points.
pub fn default_volatility_range() -> SweepRange {
    SweepRange::new("sigma", Decimal::ZERO, dec!(0.7), 500)
}

/// Hedge cost against volatility. x axis: sigma in percent.
pub fn sweep_black_scholes_volatility(
    base: &BlackScholesInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    base.pool.validate()?;
    let s0 = base.pool.initial_price()?;

    let reference = ReferenceMarker {
        x: percent(base.sigma, "sigma")?,
        label: format!("Reference sigma value ({:.4})", base.sigma),
    };
    let series = evaluate_sweep(
        range,
        SweepAxis::new("Volatility (%)", "Returns (%) from Fees needed to Break Even"),
        Some(reference),
        |sigma| {
            let cost = lp_hedge_cost(base.pool.y0, sigma, base.maturity)?;
            let expected =
                expected_discounted_divergence(s0, base.risk_free_rate, sigma, base.maturity)?;
            Ok(SweepSample::new(percent(sigma, "sigma")?)
                .with("hedge_cost", to_f64(cost))
                .with("expected_divergence_pct", to_f64(percent(expected, "s0")?)))
        },
    )?;

    let warnings = series.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Black-Scholes LP hedge cost vs. volatility",
        &serde_json::json!({
            "maturity": base.maturity.to_string(),
            "y0": base.pool.y0.to_string(),
            "range": range,
        }),
        warnings,
        elapsed,
        series,
    ))
}
