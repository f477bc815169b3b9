//! Bounded scalar minimisation by golden-section search.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::IlHedgeError;
use crate::IlHedgeResult;

/// (sqrt(5) - 1) / 2
const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_894_9;

pub const DEFAULT_TOLERANCE: f64 = 1e-10;
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minimum {
    pub x: f64,
    pub fx: f64,
    pub iterations: u32,
}

fn evaluate<F: FnMut(f64) -> f64>(f: &mut F, x: f64) -> IlHedgeResult<f64> {
    let fx = f(x);
    if fx.is_finite() {
        Ok(fx)
    } else {
        Err(IlHedgeError::invalid(
            "objective",
            format!("objective is not finite at {x}"),
        ))
    }
}

/// Minimise a unimodal `f` on `[lower, upper]`.
///
/// The bracket shrinks by the golden ratio each iteration until it is
/// narrower than `tol`. The endpoints are evaluated too, so a minimum on the
/// boundary is returned exactly rather than approached from inside.
pub fn minimize_bounded<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    tol: f64,
    max_iter: u32,
) -> IlHedgeResult<Minimum>
where
    F: FnMut(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(IlHedgeError::invalid(
            "bounds",
            format!("need finite lower < upper, got [{lower}, {upper}]"),
        ));
    }
    if tol <= 0.0 || !tol.is_finite() {
        return Err(IlHedgeError::invalid("tolerance", "must be positive"));
    }

    let (mut a, mut b) = (lower, upper);
    let mut c = b - INV_GOLDEN_RATIO * (b - a);
    let mut d = a + INV_GOLDEN_RATIO * (b - a);
    let mut fc = evaluate(&mut f, c)?;
    let mut fd = evaluate(&mut f, d)?;

    let mut iterations = 0;
    while (b - a).abs() > tol {
        if iterations >= max_iter {
            return Err(IlHedgeError::ConvergenceFailure {
                function: "minimize_bounded".into(),
                iterations,
                last_delta: Decimal::from_f64(b - a).unwrap_or(Decimal::ZERO),
            });
        }
        iterations += 1;
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_GOLDEN_RATIO * (b - a);
            fc = evaluate(&mut f, c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_GOLDEN_RATIO * (b - a);
            fd = evaluate(&mut f, d)?;
        }
    }

    let x_mid = (a + b) / 2.0;
    let mut best = Minimum {
        x: x_mid,
        fx: evaluate(&mut f, x_mid)?,
        iterations,
    };
    for edge in [lower, upper] {
        let f_edge = evaluate(&mut f, edge)?;
        if f_edge < best.fx {
            best = Minimum {
                x: edge,
                fx: f_edge,
                iterations,
            };
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_quadratic_minimum() {
        let m = minimize_bounded(|x| (x - 0.3).powi(2) + 1.0, 0.0, 1.0, 1e-10, 200).unwrap();
        assert!((m.x - 0.3).abs() < 1e-8, "x={}", m.x);
        assert!((m.fx - 1.0).abs() < 1e-12);
        assert!(m.iterations > 0);
    }

    #[test]
    fn test_boundary_minimum_is_exact() {
        let m = minimize_bounded(|x| x, 0.0, 1.0, 1e-10, 200).unwrap();
        assert_eq!(m.x, 0.0);
        let m = minimize_bounded(|x| -x, 0.0, 1.0, 1e-10, 200).unwrap();
        assert_eq!(m.x, 1.0);
    }

    #[test]
    fn test_invalid_bounds_and_tolerance() {
        assert!(minimize_bounded(|x| x * x, 1.0, 0.0, 1e-8, 100).is_err());
        assert!(minimize_bounded(|x| x * x, 0.0, 1.0, 0.0, 100).is_err());
        assert!(minimize_bounded(|x| x * x, f64::NEG_INFINITY, 1.0, 1e-8, 100).is_err());
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let result = minimize_bounded(|x| x * x, -1.0, 1.0, 1e-12, 5);
        assert!(matches!(result, Err(IlHedgeError::ConvergenceFailure { .. })));
    }

    #[test]
    fn test_non_finite_objective() {
        assert!(minimize_bounded(|x| 1.0 / (x - x), 0.0, 1.0, 1e-8, 100).is_err());
    }
}
