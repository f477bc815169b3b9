use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ilhedge_core::hedging::analysis::{self, HedgeInput};

use super::{set, PoolArgs, RangeArgs};
use crate::input;

/// Arguments for the swap-hedge comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct HedgeArgs {
    /// Volatility of the log terminal price
    #[arg(long)]
    pub sigma: Option<Decimal>,

    /// Log drift mu of the terminal price (default ln 1.25)
    #[arg(long)]
    pub mu: Option<Decimal>,

    /// Variance-swap weight reported next to the optimum
    #[arg(long)]
    pub weight: Option<f64>,

    /// Number of simulated paths
    #[arg(long)]
    pub simulations: Option<u32>,

    /// RNG seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub pool: PoolArgs,

    /// Path to JSON/YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the swap-hedge volatility sweep
#[derive(Args)]
pub struct HedgeSweepArgs {
    #[command(flatten)]
    pub model: HedgeArgs,

    #[command(flatten)]
    pub range: RangeArgs,
}

fn build_input(args: &HedgeArgs) -> Result<HedgeInput, Box<dyn std::error::Error>> {
    let mut hedge: HedgeInput = input::load(args.input.as_deref())?;
    set(&mut hedge.sigma, args.sigma);
    set(&mut hedge.log_drift, args.mu);
    set(&mut hedge.fixed_weight, args.weight);
    set(&mut hedge.num_simulations, args.simulations);
    if args.seed.is_some() {
        hedge.seed = args.seed;
    }
    args.pool.apply(&mut hedge.pool);
    Ok(hedge)
}

pub fn run_hedge(args: HedgeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let hedge = build_input(&args)?;
    let result = analysis::analyze_hedge(&hedge)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_hedge_sweep(args: HedgeSweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let hedge = build_input(&args.model)?;
    let range = args.range.resolve(analysis::default_volatility_range());
    let result = analysis::sweep_hedge_volatility(&hedge, &range)?;
    Ok(serde_json::to_value(result)?)
}
