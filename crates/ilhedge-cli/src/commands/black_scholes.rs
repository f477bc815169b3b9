use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ilhedge_core::black_scholes::hedge_cost::{self, BlackScholesInput};
use ilhedge_core::math::sigma_from_up_factor;

use super::{set, PoolArgs, RangeArgs};
use crate::input;

/// Arguments for the Black-Scholes hedge cost
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BlackScholesArgs {
    /// Annualised volatility (default ln 1.25)
    #[arg(long)]
    pub sigma: Option<Decimal>,

    /// Up factor over the maturity; sets sigma = ln(u) / sqrt(T) when --sigma is absent
    #[arg(long)]
    pub u: Option<Decimal>,

    /// Maturity in years
    #[arg(long)]
    pub maturity: Option<Decimal>,

    /// Risk-free rate; only affects the discounted expected divergence
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[command(flatten)]
    pub pool: PoolArgs,

    /// Path to JSON/YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the Black-Scholes volatility sweep
#[derive(Args)]
pub struct BlackScholesSweepArgs {
    #[command(flatten)]
    pub model: BlackScholesArgs,

    #[command(flatten)]
    pub range: RangeArgs,
}

fn build_input(args: &BlackScholesArgs) -> Result<BlackScholesInput, Box<dyn std::error::Error>> {
    let mut bs: BlackScholesInput = input::load(args.input.as_deref())?;
    apply_flags(args, &mut bs)?;
    Ok(bs)
}

fn apply_flags(
    args: &BlackScholesArgs,
    bs: &mut BlackScholesInput,
) -> Result<(), Box<dyn std::error::Error>> {
    set(&mut bs.maturity, args.maturity);
    set(&mut bs.risk_free_rate, args.rate);
    match (args.sigma, args.u) {
        (Some(sigma), _) => bs.sigma = sigma,
        (None, Some(u)) => bs.sigma = sigma_from_up_factor(u, bs.maturity)?,
        (None, None) => {}
    }
    args.pool.apply(&mut bs.pool);
    Ok(())
}

pub fn run_black_scholes(args: BlackScholesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bs = build_input(&args)?;
    let result = hedge_cost::value_black_scholes(&bs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_black_scholes_sweep(
    args: BlackScholesSweepArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let bs = build_input(&args.model)?;
    let range = args.range.resolve(hedge_cost::default_volatility_range());
    let result = hedge_cost::sweep_black_scholes_volatility(&bs, &range)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilhedge_core::REFERENCE_SIGMA;
    use rust_decimal_macros::dec;

    fn args() -> BlackScholesArgs {
        BlackScholesArgs {
            sigma: None,
            u: None,
            maturity: None,
            rate: None,
            pool: PoolArgs { x0: None, y0: None },
            input: None,
        }
    }

    #[test]
    fn test_up_factor_sets_sigma() {
        let mut bs = BlackScholesInput {
            sigma: dec!(0.5),
            ..BlackScholesInput::default()
        };
        apply_flags(&BlackScholesArgs { u: Some(dec!(1.25)), ..args() }, &mut bs).unwrap();
        assert!((bs.sigma - REFERENCE_SIGMA).abs() < dec!(0.000000000001), "sigma={}", bs.sigma);
        let cost = hedge_cost::value_black_scholes(&bs).unwrap().result.hedge_cost;
        assert!((cost - dec!(1.2409602)).abs() < dec!(0.000001), "cost={cost}");
    }

    #[test]
    fn test_sigma_flag_wins_over_up_factor() {
        let mut bs = BlackScholesInput::default();
        let flags = BlackScholesArgs {
            sigma: Some(dec!(0.4)),
            u: Some(dec!(1.25)),
            ..args()
        };
        apply_flags(&flags, &mut bs).unwrap();
        assert_eq!(bs.sigma, dec!(0.4));
    }

    #[test]
    fn test_up_factor_below_one_is_rejected() {
        let mut bs = BlackScholesInput::default();
        assert!(apply_flags(&BlackScholesArgs { u: Some(dec!(0.9)), ..args() }, &mut bs).is_err());
    }
}
