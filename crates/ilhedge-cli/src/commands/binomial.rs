use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ilhedge_core::binomial::one_period::{self, up_factor_from_sigma, BinomialInput};
use ilhedge_core::binomial::sensitivity;

use super::{set, PoolArgs, RangeArgs, SweepOver};
use crate::input;

/// Arguments for the one-period binomial valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BinomialArgs {
    /// Up-move factor u (down move is 1/u)
    #[arg(long)]
    pub u: Option<Decimal>,

    /// Per-period volatility; sets u = exp(sigma * sqrt(dt)) when --u is absent
    #[arg(long)]
    pub sigma: Option<Decimal>,

    /// One-period risk-free rate (e.g. 0.05 for 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Period length in years
    #[arg(long)]
    pub maturity: Option<Decimal>,

    /// Discount the straddle premium by 1 + r
    #[arg(long)]
    pub discount: bool,

    #[command(flatten)]
    pub pool: PoolArgs,

    /// Path to JSON/YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a binomial break-even sweep
#[derive(Args)]
pub struct BinomialSweepArgs {
    /// Parameter to sweep; volatility sweeps the up factor u
    #[arg(long, value_enum, default_value = "rate")]
    pub over: SweepOver,

    #[command(flatten)]
    pub model: BinomialArgs,

    #[command(flatten)]
    pub range: RangeArgs,
}

fn build_input(args: &BinomialArgs) -> Result<BinomialInput, Box<dyn std::error::Error>> {
    let mut bin: BinomialInput = input::load(args.input.as_deref())?;
    set(&mut bin.risk_free_rate, args.rate);
    set(&mut bin.time_step, args.maturity);
    if args.discount {
        bin.discount_premium = true;
    }
    args.pool.apply(&mut bin.pool);

    match (args.u, args.sigma) {
        (Some(u), _) => bin.up_factor = u,
        (None, Some(sigma)) => bin.up_factor = up_factor_from_sigma(sigma, bin.time_step)?,
        (None, None) => {}
    }
    Ok(bin)
}

pub fn run_binomial(args: BinomialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bin = build_input(&args)?;
    let result = one_period::value_binomial(&bin)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_binomial_sweep(args: BinomialSweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bin = build_input(&args.model)?;
    let result = match args.over {
        SweepOver::Rate => {
            let range = args.range.resolve(sensitivity::default_rate_range());
            sensitivity::sweep_binomial_rate(&bin, &range)?
        }
        SweepOver::Volatility => {
            let range = args.range.resolve(sensitivity::default_up_factor_range());
            sensitivity::sweep_binomial_volatility(&bin, &range)?
        }
    };
    Ok(serde_json::to_value(result)?)
}
