use ilhedge_core::binomial::one_period::{value_binomial, BinomialInput};
use ilhedge_core::binomial::sensitivity::sweep_binomial_rate;
use ilhedge_core::black_scholes::hedge_cost::{
    sweep_black_scholes_volatility, value_black_scholes, BlackScholesInput,
};
use ilhedge_core::continuous::estimator::{estimate_h0, sweep_continuous_rate, ContinuousInput};
use ilhedge_core::math::to_f64;
use ilhedge_core::sweep::{evaluate_grid, SweepRange};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// The three models agree at the reference parameters
// ===========================================================================

#[test]
fn test_binomial_close_to_black_scholes() {
    let binomial = value_binomial(&BinomialInput::default()).unwrap().result;
    let bs = value_black_scholes(&BlackScholesInput::default()).unwrap().result;
    let gap = (binomial.fee_breakeven_pct - bs.hedge_cost).abs();
    assert!(gap < dec!(0.01), "binomial={} bs={}", binomial.fee_breakeven_pct, bs.hedge_cost);
}

#[test]
fn test_monte_carlo_matches_black_scholes_at_zero_rate() {
    let bs = value_black_scholes(&BlackScholesInput {
        sigma: dec!(0.4),
        ..BlackScholesInput::default()
    })
    .unwrap()
    .result;
    let mc = estimate_h0(&ContinuousInput {
        sigma: dec!(0.4),
        num_simulations: 100_000,
        seed: Some(5),
        antithetic: true,
        ..ContinuousInput::default()
    })
    .unwrap()
    .result;
    let exact = to_f64(bs.hedge_cost);
    assert!((mc.analytic_h0 - exact).abs() < 1e-9);
    assert!((mc.h0 - exact).abs() < 0.03 * exact, "mc={} exact={}", mc.h0, exact);
}

// ===========================================================================
// Sweep shape
// ===========================================================================

#[test]
fn test_binomial_breakeven_rises_with_rate() {
    let range = SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.2), 21);
    let out = sweep_binomial_rate(&BinomialInput::default(), &range).unwrap();
    let series = &out.result;
    // 1 + r < u fails from r = 0.25, so every point here is admissible
    assert!(series.skipped.is_empty());
    let fees = series.column("fee_breakeven_pct");
    assert_eq!(fees.len(), 21);
    assert!(fees.windows(2).all(|w| w[1] >= w[0] - 1e-12));
    assert_eq!(series.reference.as_ref().map(|r| r.x), Some(Decimal::ZERO));
}

#[test]
fn test_binomial_sweep_skips_arbitrage_points() {
    let range = SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.5), 11);
    let out = sweep_binomial_rate(&BinomialInput::default(), &range).unwrap();
    assert!(!out.result.skipped.is_empty());
    assert!(!out.warnings.is_empty());
    assert_eq!(out.result.points.len() + out.result.skipped.len(), 11);
}

#[test]
fn test_black_scholes_cost_grows_with_volatility() {
    let range = SweepRange::new("sigma", Decimal::ZERO, dec!(0.7), 15);
    let out = sweep_black_scholes_volatility(&BlackScholesInput::default(), &range).unwrap();
    let costs = out.result.column("hedge_cost");
    assert_eq!(costs[0], 0.0);
    assert!(costs.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_continuous_rate_sweep_is_reproducible() {
    let base = ContinuousInput {
        num_simulations: 2_000,
        seed: Some(99),
        ..ContinuousInput::default()
    };
    let range = SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.2), 5);
    let a = sweep_continuous_rate(&base, &range).unwrap().result;
    let b = sweep_continuous_rate(&base, &range).unwrap().result;
    assert_eq!(a.column("h0"), b.column("h0"));
}

#[test]
fn test_grid_over_binomial_model() {
    let rates = SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.1), 3);
    let ups = SweepRange::new("up_factor", dec!(1.1), dec!(1.5), 3);
    let out = evaluate_grid(&rates, &ups, "fee_breakeven_pct", |r, u| {
        let res = value_binomial(&BinomialInput {
            up_factor: u,
            risk_free_rate: r,
            ..BinomialInput::default()
        })?;
        Ok(to_f64(res.result.fee_breakeven_pct))
    })
    .unwrap();
    let grid = &out.result;
    assert_eq!(grid.base_case_position, (1, 1));
    // r = 0.1 with u = 1.1 violates 1 + r < u
    assert!(grid.matrix[2][0].is_none());
    assert!(grid.matrix[0][0].is_some());
    assert!(!out.warnings.is_empty());
}
