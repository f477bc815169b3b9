use ilhedge_core::binomial::one_period::{value_binomial, BinomialInput};
use ilhedge_core::black_scholes::hedge_cost::{value_black_scholes, BlackScholesInput};
use ilhedge_core::continuous::estimator::{estimate_h0, ContinuousInput};
use ilhedge_core::hedging::analysis::{analyze_hedge, HedgeInput};
use ilhedge_core::IlHedgeError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
    (a - b).abs() < eps
}

// ===========================================================================
// Published figures at u = 5/4, r = 0, sigma = ln(5/4), x0 = y0 = 100
// ===========================================================================

#[test]
fn test_binomial_reference_breakeven() {
    let out = value_binomial(&BinomialInput::default()).unwrap();
    let res = &out.result;
    assert!(approx_eq(res.pi_up, dec!(4) / dec!(9), dec!(0.0000000001)));
    assert!(approx_eq(res.straddle_premium, dec!(2) / dec!(9), dec!(0.0000000001)));
    assert!(
        approx_eq(res.fee_breakeven_pct, dec!(1.238402), dec!(0.000001)),
        "fee_breakeven_pct={}",
        res.fee_breakeven_pct
    );
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_black_scholes_reference_cost() {
    let out = value_black_scholes(&BlackScholesInput::default()).unwrap();
    let res = &out.result;
    assert!(
        approx_eq(res.hedge_cost, dec!(1.2409602), dec!(0.000001)),
        "hedge_cost={}",
        res.hedge_cost
    );
    assert!(approx_eq(res.lp_value_initial, dec!(200), dec!(0.000000001)));
}

#[test]
fn test_continuous_reference_estimate() {
    let input = ContinuousInput {
        num_simulations: 200_000,
        seed: Some(2021),
        ..ContinuousInput::default()
    };
    let out = estimate_h0(&input).unwrap();
    let res = &out.result;
    assert!((res.analytic_h0 - 1.2409602).abs() < 1e-6, "analytic={}", res.analytic_h0);
    assert!(
        res.abs_error < 4.0 * res.std_error,
        "h0={} analytic={} se={}",
        res.h0,
        res.analytic_h0,
        res.std_error
    );
    assert!(res.confidence_interval.0 < res.h0 && res.h0 < res.confidence_interval.1);
    assert_eq!(out.metadata.precision, "ieee754_f64");
}

#[test]
fn test_hedge_reference_run() {
    let input = HedgeInput {
        num_simulations: 100_000,
        seed: Some(11),
        ..HedgeInput::default()
    };
    let out = analyze_hedge(&input).unwrap();
    let res = &out.result;
    assert!(res.avg_impermanent_loss > 0.0);
    assert!(res.avg_gamma_hedged_loss >= 0.0);
    assert!(res.avg_variance_hedged_loss >= 0.0);
    assert!((0.0..=1.0).contains(&res.optimal_weight));
    assert!(res.optimal_mse <= res.fixed_weight_mse);
}

// ===========================================================================
// Input rejection
// ===========================================================================

#[test]
fn test_binomial_arbitrage_rejected() {
    let input = BinomialInput {
        risk_free_rate: dec!(0.3),
        ..BinomialInput::default()
    };
    match value_binomial(&input) {
        Err(IlHedgeError::FinancialImpossibility(_)) => {}
        other => panic!("expected FinancialImpossibility, got {other:?}"),
    }
}

#[test]
fn test_black_scholes_rejects_zero_maturity() {
    let input = BlackScholesInput {
        maturity: Decimal::ZERO,
        ..BlackScholesInput::default()
    };
    assert!(matches!(
        value_black_scholes(&input),
        Err(IlHedgeError::InvalidInput { .. })
    ));
}

#[test]
fn test_inputs_deserialize_with_reference_defaults() {
    let input: BinomialInput = serde_json::from_str("{}").unwrap();
    assert_eq!(input.up_factor, dec!(1.25));
    assert_eq!(input.pool.x0, dec!(100));

    let input: ContinuousInput = serde_json::from_str(r#"{"risk_free_rate": "0.05"}"#).unwrap();
    assert_eq!(input.risk_free_rate, dec!(0.05));
    assert_eq!(input.num_simulations, 1_000_000);
    assert!(input.seed.is_none());
}
