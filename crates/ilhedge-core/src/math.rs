//! Decimal helpers shared by the closed-form models.
//!
//! Taylor series and Newton iterations, good to roughly 1e-20 on the
//! arguments the models produce.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IlHedgeError;
use crate::types::{Rate, Years};
use crate::IlHedgeResult;

const EXP_TAYLOR_TERMS: u32 = 25;
const NEWTON_MAX_ITERATIONS: u32 = 100;
const NEWTON_TOLERANCE: Decimal = dec!(0.0000000000000000000001);
const EXP_ARGUMENT_LIMIT: Decimal = dec!(60);

/// Taylor series exp(x) with range reduction for |x| > 2.
/// exp(x) = exp(x/2)^2 when |x| > 2, then Taylor with 25 terms.
fn exp_unchecked(x: Decimal) -> Decimal {
    let two = dec!(2);
    if x > two || x < -two {
        let half = exp_unchecked(x / two);
        return half * half;
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1..=EXP_TAYLOR_TERMS {
        term = term * x / Decimal::from(n);
        sum += term;
    }
    sum
}

pub(crate) fn exp_decimal(x: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    // e^60 ~ 1.1e26 is close to what a 96-bit mantissa holds.
    if x > EXP_ARGUMENT_LIMIT {
        return Err(IlHedgeError::invalid(
            context,
            format!("exponential overflow at {x}"),
        ));
    }
    if x < -EXP_ARGUMENT_LIMIT {
        return Ok(Decimal::ZERO);
    }
    Ok(exp_unchecked(x))
}

/// Newton's method sqrt: y_{n+1} = (y_n + x/y_n) / 2.
pub(crate) fn sqrt_decimal(x: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    if x < Decimal::ZERO {
        return Err(IlHedgeError::invalid(
            context,
            format!("square root of negative value {x}"),
        ));
    }
    if x.is_zero() || x == Decimal::ONE {
        return Ok(x);
    }

    let two = dec!(2);
    let mut guess = if x > Decimal::ONE { x / two } else { x };
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let next = (guess + x / guess) / two;
        if (next - guess).abs() < NEWTON_TOLERANCE * next.max(Decimal::ONE) {
            return Ok(next);
        }
        guess = next;
    }
    Ok(guess)
}

/// Natural log via Newton's method on exp(y) = x.
pub(crate) fn ln_decimal(x: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    if x <= Decimal::ZERO {
        return Err(IlHedgeError::invalid(
            context,
            format!("logarithm of non-positive value {x}"),
        ));
    }
    if x == Decimal::ONE {
        return Ok(Decimal::ZERO);
    }

    // Pull x into [1/e, e] so the first guess is close.
    let e = dec!(2.718281828459045235360287471);
    let mut shift = Decimal::ZERO;
    let mut v = x;
    while v > e {
        v /= e;
        shift += Decimal::ONE;
    }
    while v < Decimal::ONE / e {
        v *= e;
        shift -= Decimal::ONE;
    }

    // y_{n+1} = y_n - 1 + v / exp(y_n)
    let mut y = v - Decimal::ONE;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let next = y - Decimal::ONE + v / exp_unchecked(y);
        if (next - y).abs() < NEWTON_TOLERANCE {
            y = next;
            break;
        }
        y = next;
    }
    Ok(y + shift)
}

/// Lossy conversion used at the boundary between closed forms and simulation.
pub fn to_f64(x: Decimal) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// `a * b`, or `InvalidInput` on `context` when the product leaves the Decimal range.
pub(crate) fn checked_mul(a: Decimal, b: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| IlHedgeError::invalid(context, format!("{a} * {b} overflows")))
}

pub(crate) fn checked_div(a: Decimal, b: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    if b.is_zero() {
        return Err(IlHedgeError::DivisionByZero {
            context: context.to_string(),
        });
    }
    a.checked_div(b)
        .ok_or_else(|| IlHedgeError::invalid(context, format!("{a} / {b} overflows")))
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| IlHedgeError::invalid(context, format!("{a} + {b} overflows")))
}

/// Value expressed in percent, checked.
pub(crate) fn percent(x: Decimal, context: &str) -> IlHedgeResult<Decimal> {
    checked_mul(x, dec!(100), context)
}

/// sigma = ln(u) / sqrt(dt), as a decimal (0.22 = 22%).
pub fn sigma_from_up_factor(u: Decimal, dt: Years) -> IlHedgeResult<Rate> {
    if u <= Decimal::ONE {
        return Err(IlHedgeError::invalid("up_factor", "must be greater than 1"));
    }
    if dt <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("time_step", "must be positive"));
    }
    Ok(ln_decimal(u, "up_factor")? / sqrt_decimal(dt, "time_step")?)
}

/// u = exp(sigma * sqrt(dt)); inverse of [`sigma_from_up_factor`].
pub fn up_factor_from_sigma(sigma: Rate, dt: Years) -> IlHedgeResult<Decimal> {
    if sigma < Decimal::ZERO {
        return Err(IlHedgeError::invalid("sigma", "must be non-negative"));
    }
    if dt <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("time_step", "must be positive"));
    }
    let exponent = checked_mul(sigma, sqrt_decimal(dt, "time_step")?, "sigma")?;
    exp_decimal(exponent, "sigma")
}

pub(crate) fn require_finite(x: f64, field: &str) -> IlHedgeResult<()> {
    if x.is_finite() {
        Ok(())
    } else {
        Err(IlHedgeError::invalid(field, "must be a finite number"))
    }
}
