use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ilhedge_core::continuous::estimator::{self, ContinuousInput};
use ilhedge_core::continuous::sigma_from_up_factor;

use super::{set, PoolArgs, RangeArgs, SweepOver};
use crate::input;

/// Arguments for the Monte Carlo divergence estimate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ContinuousArgs {
    /// Risk-free rate
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Annualised volatility (default ln 1.25)
    #[arg(long)]
    pub sigma: Option<Decimal>,

    /// Up factor over the maturity; sets sigma = ln(u) / sqrt(T) when --sigma is absent
    #[arg(long)]
    pub u: Option<Decimal>,

    /// Maturity in years
    #[arg(long)]
    pub maturity: Option<Decimal>,

    /// Number of simulated paths
    #[arg(long)]
    pub simulations: Option<u32>,

    /// RNG seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use antithetic variates
    #[arg(long)]
    pub antithetic: bool,

    #[command(flatten)]
    pub pool: PoolArgs,

    /// Path to JSON/YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a Monte Carlo sweep
#[derive(Args)]
pub struct ContinuousSweepArgs {
    /// Parameter to sweep
    #[arg(long, value_enum, default_value = "rate")]
    pub over: SweepOver,

    #[command(flatten)]
    pub model: ContinuousArgs,

    #[command(flatten)]
    pub range: RangeArgs,
}

fn build_input(args: &ContinuousArgs) -> Result<ContinuousInput, Box<dyn std::error::Error>> {
    let mut mc: ContinuousInput = input::load(args.input.as_deref())?;
    apply_flags(args, &mut mc)?;
    Ok(mc)
}

fn apply_flags(
    args: &ContinuousArgs,
    mc: &mut ContinuousInput,
) -> Result<(), Box<dyn std::error::Error>> {
    set(&mut mc.risk_free_rate, args.rate);
    set(&mut mc.maturity, args.maturity);
    match (args.sigma, args.u) {
        (Some(sigma), _) => mc.sigma = sigma,
        (None, Some(u)) => mc.sigma = sigma_from_up_factor(u, mc.maturity)?,
        (None, None) => {}
    }
    set(&mut mc.num_simulations, args.simulations);
    if args.seed.is_some() {
        mc.seed = args.seed;
    }
    if args.antithetic {
        mc.antithetic = true;
    }
    args.pool.apply(&mut mc.pool);
    Ok(())
}

pub fn run_continuous(args: ContinuousArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc = build_input(&args)?;
    let result = estimator::estimate_h0(&mc)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_continuous_sweep(args: ContinuousSweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc = build_input(&args.model)?;
    let result = match args.over {
        SweepOver::Rate => {
            let range = args.range.resolve(estimator::default_rate_range());
            estimator::sweep_continuous_rate(&mc, &range)?
        }
        SweepOver::Volatility => {
            let range = args.range.resolve(estimator::default_volatility_range());
            estimator::sweep_continuous_volatility(&mc, &range)?
        }
    };
    Ok(serde_json::to_value(result)?)
}
