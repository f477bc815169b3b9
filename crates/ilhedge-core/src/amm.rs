//! Constant-product (x * y = k) pool accounting.
//!
//! The pool starts balanced, so the initial price of the risky asset in units
//! of the numéraire is `S0 = y0 / x0`. An LP position is worth
//! `V_LP(S) = 2 L sqrt(S)` with `L = sqrt(x0 * y0)`; holding the deposit
//! instead is worth `x0 * S + y0`. The gap between the two is the divergence
//! (impermanent) loss and equals `x0 * (sqrt(S) - sqrt(S0))^2`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IlHedgeError;
use crate::math::{checked_add, checked_div, checked_mul, sqrt_decimal};
use crate::types::Money;
use crate::IlHedgeResult;

fn default_reserve() -> Money {
    dec!(100)
}

/// Initial reserves of a constant-product pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantProductPool {
    /// Units of the risky asset.
    #[serde(default = "default_reserve")]
    pub x0: Money,
    /// Units of the numéraire.
    #[serde(default = "default_reserve")]
    pub y0: Money,
}

impl Default for ConstantProductPool {
    fn default() -> Self {
        ConstantProductPool {
            x0: default_reserve(),
            y0: default_reserve(),
        }
    }
}

impl ConstantProductPool {
    pub fn new(x0: Money, y0: Money) -> IlHedgeResult<Self> {
        let pool = ConstantProductPool { x0, y0 };
        pool.validate()?;
        Ok(pool)
    }

    pub fn validate(&self) -> IlHedgeResult<()> {
        if self.x0 <= Decimal::ZERO {
            return Err(IlHedgeError::invalid("x0", "reserve must be positive"));
        }
        if self.y0 <= Decimal::ZERO {
            return Err(IlHedgeError::invalid("y0", "reserve must be positive"));
        }
        Ok(())
    }

    /// L = sqrt(x0 * y0), taken as sqrt(x0) * sqrt(y0) so large reserves stay in range.
    pub fn liquidity(&self) -> IlHedgeResult<Decimal> {
        checked_mul(
            sqrt_decimal(self.x0, "x0")?,
            sqrt_decimal(self.y0, "y0")?,
            "liquidity",
        )
    }

    /// S0 = y0 / x0
    pub fn initial_price(&self) -> IlHedgeResult<Decimal> {
        checked_div(self.y0, self.x0, "initial price")
    }

    /// Value of the LP position when the risky asset trades at `price`.
    pub fn lp_value(&self, price: Decimal) -> IlHedgeResult<Money> {
        require_positive_price(price)?;
        let value = checked_mul(self.liquidity()?, sqrt_decimal(price, "price")?, "lp_value")?;
        checked_mul(dec!(2), value, "lp_value")
    }

    /// Value of the untouched deposit at `price`.
    pub fn hold_value(&self, price: Decimal) -> IlHedgeResult<Money> {
        require_positive_price(price)?;
        checked_add(checked_mul(self.x0, price, "hold_value")?, self.y0, "hold_value")
    }

    /// hold_value - lp_value; never negative.
    pub fn divergence_loss(&self, price: Decimal) -> IlHedgeResult<Money> {
        let loss = self.hold_value(price)? - self.lp_value(price)?;
        // Rounding in the square roots can leave a tiny negative residue at S = S0.
        Ok(loss.max(Decimal::ZERO))
    }
}

fn require_positive_price(price: Decimal) -> IlHedgeResult<()> {
    if price <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("price", "must be positive"));
    }
    Ok(())
}

/// Impermanent loss relative to holding, as a fraction, for a price ratio
/// `k = S / S0`: `2 sqrt(k) / (1 + k) - 1`. Always `<= 0`.
pub fn impermanent_loss_fraction(price_ratio: Decimal) -> IlHedgeResult<Decimal> {
    if price_ratio <= Decimal::ZERO {
        return Err(IlHedgeError::invalid("price_ratio", "must be positive"));
    }
    let denominator = checked_add(Decimal::ONE, price_ratio, "price_ratio")?;
    let il = dec!(2) * sqrt_decimal(price_ratio, "price_ratio")? / denominator - Decimal::ONE;
    Ok(il.min(Decimal::ZERO))
}

/// f64 counterpart of [`ConstantProductPool`] used inside simulation loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolF64 {
    pub x0: f64,
    pub s0: f64,
}

impl PoolF64 {
    pub fn from_pool(pool: &ConstantProductPool) -> IlHedgeResult<Self> {
        pool.validate()?;
        Ok(PoolF64 {
            x0: crate::math::to_f64(pool.x0),
            s0: crate::math::to_f64(pool.initial_price()?),
        })
    }

    /// x0 * (sqrt(S) - sqrt(S0))^2
    #[inline]
    pub fn divergence_loss(&self, price: f64) -> f64 {
        self.x0 * (price.sqrt() - self.s0.sqrt()).powi(2)
    }
}
