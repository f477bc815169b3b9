use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use ilhedge_core::binomial::one_period::{value_binomial, BinomialInput};
use ilhedge_core::black_scholes::hedge_cost::{value_black_scholes, BlackScholesInput};
use ilhedge_core::continuous::estimator::{estimate_h0, ContinuousInput};
use ilhedge_core::hedging::analysis::{analyze_hedge, HedgeInput};
use ilhedge_core::with_metadata_f64;

/// Arguments for reproducing the reference figures
#[derive(Args)]
pub struct ReplicateArgs {
    /// Paths for the simulated models
    #[arg(long)]
    pub simulations: Option<u32>,

    /// RNG seed for the simulated models
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Every model at u = 5/4, r = 0, sigma = ln(5/4), T = 1, x0 = y0 = 100.
pub fn run_replicate(args: ReplicateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let binomial = value_binomial(&BinomialInput::default())?;
    let black_scholes = value_black_scholes(&BlackScholesInput::default())?;

    let mut mc_input = ContinuousInput {
        seed: args.seed,
        ..ContinuousInput::default()
    };
    let mut hedge_input = HedgeInput {
        seed: args.seed,
        ..HedgeInput::default()
    };
    if let Some(n) = args.simulations {
        mc_input.num_simulations = n;
        hedge_input.num_simulations = n;
    }
    let continuous = estimate_h0(&mc_input)?;
    let hedge = analyze_hedge(&hedge_input)?;

    let warnings: Vec<String> = [
        &binomial.warnings,
        &black_scholes.warnings,
        &continuous.warnings,
        &hedge.warnings,
    ]
    .into_iter()
    .flatten()
    .cloned()
    .collect();

    let result = json!({
        "binomial_fee_breakeven_pct": binomial.result.fee_breakeven_pct,
        "binomial_straddle_premium": binomial.result.straddle_premium,
        "binomial_hedge_ratio": binomial.result.hedge_ratio,
        "black_scholes_hedge_cost": black_scholes.result.hedge_cost,
        "monte_carlo_h0": continuous.result.h0,
        "monte_carlo_std_error": continuous.result.std_error,
        "monte_carlo_analytic_h0": continuous.result.analytic_h0,
        "hedge_avg_impermanent_loss": hedge.result.avg_impermanent_loss,
        "hedge_optimal_weight": hedge.result.optimal_weight,
        "hedge_unhedged_gamma": hedge.result.unhedged_gamma,
        "hedge_unhedged_variance": hedge.result.unhedged_variance,
        "hedge_unhedged_weighted": hedge.result.unhedged_weighted,
    });

    let output = with_metadata_f64(
        "Reference parameters through every model",
        &json!({
            "up_factor": "1.25",
            "risk_free_rate": "0",
            "sigma": "ln(1.25)",
            "maturity": "1",
            "x0": "100",
            "y0": "100",
            "num_simulations": mc_input.num_simulations,
            "seed": args.seed,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
