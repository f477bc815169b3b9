pub mod binomial;
pub mod black_scholes;
pub mod continuous;
pub mod hedging;
pub mod replicate;
pub mod sensitivity;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use ilhedge_core::amm::ConstantProductPool;
use ilhedge_core::sweep::SweepRange;

/// Pool reserve overrides shared by every model
#[derive(Args, Debug, Clone, Default)]
pub struct PoolArgs {
    /// Initial reserve of the risky asset
    #[arg(long)]
    pub x0: Option<Decimal>,

    /// Initial reserve of the numeraire
    #[arg(long)]
    pub y0: Option<Decimal>,
}

impl PoolArgs {
    pub fn apply(&self, pool: &mut ConstantProductPool) {
        if let Some(x0) = self.x0 {
            pool.x0 = x0;
        }
        if let Some(y0) = self.y0 {
            pool.y0 = y0;
        }
    }
}

/// Overrides for the swept range; unset bounds keep the model's defaults
#[derive(Args, Debug, Clone, Default)]
#[command(allow_hyphen_values = true)]
pub struct RangeArgs {
    /// Number of points, both ends included
    #[arg(long)]
    pub points: Option<u32>,

    /// First value of the swept parameter
    #[arg(long)]
    pub start: Option<Decimal>,

    /// Last value of the swept parameter
    #[arg(long)]
    pub end: Option<Decimal>,
}

impl RangeArgs {
    pub fn resolve(&self, default: SweepRange) -> SweepRange {
        SweepRange {
            start: self.start.unwrap_or(default.start),
            end: self.end.unwrap_or(default.end),
            points: self.points.unwrap_or(default.points),
            name: default.name,
        }
    }
}

/// Parameter a one-dimensional sweep runs over
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SweepOver {
    Rate,
    Volatility,
}

fn set<T: Copy>(target: &mut T, flag: Option<T>) {
    if let Some(v) = flag {
        *target = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_range_overrides() {
        let default = SweepRange::new("sigma", dec!(0), dec!(0.7), 500);
        let args = RangeArgs {
            points: Some(8),
            start: None,
            end: Some(dec!(1.2)),
        };
        let range = args.resolve(default);
        assert_eq!(range.name, "sigma");
        assert_eq!(range.start, dec!(0));
        assert_eq!(range.end, dec!(1.2));
        assert_eq!(range.points, 8);
    }

    #[test]
    fn test_pool_overrides_only_given_reserves() {
        let mut pool = ConstantProductPool::default();
        PoolArgs {
            x0: Some(dec!(50)),
            y0: None,
        }
        .apply(&mut pool);
        assert_eq!(pool.x0, dec!(50));
        assert_eq!(pool.y0, dec!(100));
    }
}
