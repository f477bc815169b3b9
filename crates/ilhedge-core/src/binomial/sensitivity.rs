//! Binomial break-even fee return as a function of the interest rate and of
//! the volatility implied by the up factor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Instant;

use super::one_period::{breakeven, sigma_from_up_factor, BinomialInput};
use crate::error::IlHedgeError;
use crate::math::{percent, to_f64};
use crate::sweep::{evaluate_sweep, ReferenceMarker, SweepAxis, SweepRange, SweepSample, SweepSeries};
use crate::types::*;
use crate::IlHedgeResult;

pub const FEE_BREAKEVEN_LABEL: &str = "Returns (%) from Fees needed to Break Even";

/// r from 0% to 20%, 500 points.
pub fn default_rate_range() -> SweepRange {
    SweepRange::new("risk_free_rate", Decimal::ZERO, dec!(0.20), 500)
}

/// u from 1.01 to 2, 100 points.
pub fn default_up_factor_range() -> SweepRange {
    SweepRange::new("up_factor", dec!(1.01), dec!(2), 100)
}

fn sample_at(u: Decimal, r: Rate, x: Decimal, discount: bool) -> IlHedgeResult<SweepSample> {
    let b = breakeven(u, r, discount)?;
    Ok(SweepSample::new(x)
        .with("fee_breakeven_pct", to_f64(b.fee_breakeven_pct))
        .with("straddle_premium", to_f64(b.premium.total))
        .with("hedge_ratio", to_f64(b.hedge_ratio))
        .with("pi_up", to_f64(b.pi_up)))
}

/// Sweep the risk-free rate at the base up factor. x axis: r in percent.
pub fn sweep_binomial_rate(
    base: &BinomialInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    base.pool.validate()?;

    let reference = ReferenceMarker {
        x: percent(base.risk_free_rate, "risk_free_rate")?,
        label: format!("Reference r value ({})", base.risk_free_rate),
    };
    let series = evaluate_sweep(
        range,
        SweepAxis::new("Risk Free Interest Rate (%)", FEE_BREAKEVEN_LABEL),
        Some(reference),
        |r| sample_at(base.up_factor, r, percent(r, "risk_free_rate")?, base.discount_premium),
    )?;

    let warnings = series.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Binomial break-even fee return vs. risk-free rate",
        &serde_json::json!({
            "up_factor": base.up_factor.to_string(),
            "range": range,
            "discount_premium": base.discount_premium,
        }),
        warnings,
        elapsed,
        series,
    ))
}

/// Sweep the up factor at the base rate. x axis: sigma = 100 ln(u) / sqrt(dt).
pub fn sweep_binomial_volatility(
    base: &BinomialInput,
    range: &SweepRange,
) -> IlHedgeResult<ComputationOutput<SweepSeries>> {
    let start = Instant::now();
    if range.start <= Decimal::ONE {
        return Err(IlHedgeError::invalid(
            format!("sweep:{}", range.name),
            "up factors must be greater than 1",
        ));
    }

    let reference_sigma = sigma_from_up_factor(base.up_factor, base.time_step)?;
    let reference = ReferenceMarker {
        x: percent(reference_sigma, "up_factor")?,
        label: format!("Reference sigma for u = {}", base.up_factor),
    };
    let dt = base.time_step;
    let series = evaluate_sweep(
        range,
        SweepAxis::new("Implied Volatility % (sigma)", FEE_BREAKEVEN_LABEL),
        Some(reference),
        |u| {
            let sigma_pct = percent(sigma_from_up_factor(u, dt)?, "up_factor")?;
            sample_at(u, base.risk_free_rate, sigma_pct, base.discount_premium)
        },
    )?;

    let warnings = series.warnings();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Binomial break-even fee return vs. volatility implied by the up factor",
        &serde_json::json!({
            "risk_free_rate": base.risk_free_rate.to_string(),
            "time_step": dt.to_string(),
            "range": range,
            "discount_premium": base.discount_premium,
        }),
        warnings,
        elapsed,
        series,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rate_sweep_default_range() {
        let out = sweep_binomial_rate(&BinomialInput::default(), &default_rate_range()).unwrap();
        let series = &out.result;
        // 1 + r stays below u = 1.25 over [0, 0.2]
        assert_eq!(series.points.len(), 500);
        assert!(series.skipped.is_empty());
        assert_eq!(series.points[0].x, Decimal::ZERO);
        assert_eq!(series.points[499].x, dec!(20));
        let first = series.points[0].values["fee_breakeven_pct"];
        assert!((first - 1.238402).abs() < 1e-6, "first={first}");
        assert_eq!(series.reference.as_ref().unwrap().x, Decimal::ZERO);
    }

    #[test]
    fn test_rate_sweep_is_increasing() {
        let range = SweepRange::new("risk_free_rate", dec!(0), dec!(0.2), 21);
        let out = sweep_binomial_rate(&BinomialInput::default(), &range).unwrap();
        let ys = out.result.column("fee_breakeven_pct");
        assert!(ys.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rate_sweep_skips_arbitrage_points() {
        // 1 + r >= 1.25 for r >= 0.25
        let range = SweepRange::new("risk_free_rate", dec!(0.2), dec!(0.3), 11);
        let out = sweep_binomial_rate(&BinomialInput::default(), &range).unwrap();
        assert_eq!(out.result.points.len(), 5);
        assert_eq!(out.result.skipped.len(), 6);
        assert_eq!(out.warnings.len(), 6);
    }

    #[test]
    fn test_volatility_sweep() {
        let out =
            sweep_binomial_volatility(&BinomialInput::default(), &default_up_factor_range()).unwrap();
        let series = &out.result;
        assert_eq!(series.points.len(), 100);
        // sigma at u = 2 is 100 ln 2
        let last_x = to_f64(series.points[99].x);
        assert!((last_x - 69.314718).abs() < 1e-5, "last_x={last_x}");
        let ys = series.column("fee_breakeven_pct");
        assert!(ys.windows(2).all(|w| w[1] > w[0]));
        let reference = to_f64(series.reference.as_ref().unwrap().x);
        assert!((reference - 22.314355).abs() < 1e-5);
    }

    #[test]
    fn test_volatility_sweep_rejects_unit_up_factor() {
        let range = SweepRange::new("up_factor", dec!(1), dec!(2), 10);
        assert!(sweep_binomial_volatility(&BinomialInput::default(), &range).is_err());
    }
}
