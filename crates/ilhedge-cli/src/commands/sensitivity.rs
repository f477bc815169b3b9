use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use ilhedge_core::binomial::one_period::{value_binomial, BinomialInput};
use ilhedge_core::black_scholes::hedge_cost::{value_black_scholes, BlackScholesInput};
use ilhedge_core::continuous::estimator::{estimate_h0, ContinuousInput};
use ilhedge_core::continuous::gbm::resolve_seed;
use ilhedge_core::math::to_f64;
use ilhedge_core::sweep::{evaluate_grid, evaluate_sweep, SweepAxis, SweepRange, SweepSample};
use ilhedge_core::{with_metadata_f64, IlHedgeResult};

use crate::input;

/// Model a sensitivity runs against
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SensitivityModel {
    Binomial,
    BlackScholes,
    Continuous,
}

impl SensitivityModel {
    fn metric(self) -> &'static str {
        match self {
            SensitivityModel::Binomial => "fee_breakeven_pct",
            SensitivityModel::BlackScholes => "hedge_cost",
            SensitivityModel::Continuous => "h0",
        }
    }

    /// Input fields a sensitivity variable may address.
    fn fields(self) -> &'static [&'static str] {
        match self {
            SensitivityModel::Binomial => &["up_factor", "risk_free_rate", "time_step", "x0", "y0"],
            SensitivityModel::BlackScholes => &["sigma", "maturity", "risk_free_rate", "x0", "y0"],
            SensitivityModel::Continuous => &["risk_free_rate", "sigma", "maturity", "x0", "y0"],
        }
    }

    /// Map a variable name (or its short form) onto an input field of this model.
    fn resolve_field(self, name: &str) -> Result<&'static str, String> {
        let canonical = match (self, name) {
            (_, "rate" | "r") => "risk_free_rate",
            (SensitivityModel::Binomial, "u") => "up_factor",
            (SensitivityModel::Binomial, "maturity" | "dt") => "time_step",
            _ => name,
        };
        self.fields()
            .iter()
            .copied()
            .find(|f| *f == canonical)
            .ok_or_else(|| {
                format!(
                    "Unknown variable '{name}' for the {} model; expected one of: {}",
                    self.label(),
                    self.fields().join(", ")
                )
            })
    }

    fn label(self) -> &'static str {
        match self {
            SensitivityModel::Binomial => "binomial",
            SensitivityModel::BlackScholes => "black-scholes",
            SensitivityModel::Continuous => "continuous",
        }
    }

    fn evaluate(self, params: Value) -> IlHedgeResult<f64> {
        match self {
            SensitivityModel::Binomial => {
                let input: BinomialInput = serde_json::from_value(params)?;
                Ok(to_f64(value_binomial(&input)?.result.fee_breakeven_pct))
            }
            SensitivityModel::BlackScholes => {
                let input: BlackScholesInput = serde_json::from_value(params)?;
                Ok(to_f64(value_black_scholes(&input)?.result.hedge_cost))
            }
            SensitivityModel::Continuous => {
                let input: ContinuousInput = serde_json::from_value(params)?;
                Ok(estimate_h0(&input)?.result.h0)
            }
        }
    }
}

/// Arguments for one- or two-way sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Model to run the sensitivity on
    #[arg(long, value_enum)]
    pub model: SensitivityModel,

    /// First variable as name:start:end:points
    /// (e.g. "risk_free_rate:0:0.2:21"; x0 and y0 address the pool,
    /// "rate" stands for risk_free_rate and, for binomial, "u" for up_factor)
    #[arg(long, allow_hyphen_values = true)]
    pub var1: String,

    /// Second variable (optional, creates a 2D grid)
    #[arg(long, allow_hyphen_values = true)]
    pub var2: Option<String>,

    /// Paths per evaluation for the continuous model
    #[arg(long)]
    pub simulations: Option<u32>,

    /// RNG seed shared by every evaluation of the continuous model
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to JSON/YAML file with base case inputs
    #[arg(long)]
    pub input: Option<String>,
}

fn parse_sens_var(
    model: SensitivityModel,
    arg: &str,
) -> Result<SweepRange, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:start:end:points, got '{}'",
            arg
        )
        .into());
    }
    Ok(SweepRange::new(
        model.resolve_field(parts[0])?,
        parts[1].parse()?,
        parts[2].parse()?,
        parts[3].parse()?,
    ))
}

/// Write `value` into the base inputs; pool reserves live under `pool`.
fn set_json_field(obj: &mut Value, field: &str, value: Decimal) {
    let target = match field {
        "x0" | "y0" => {
            if !obj.get("pool").is_some_and(Value::is_object) {
                obj["pool"] = Value::Object(Default::default());
            }
            &mut obj["pool"]
        }
        _ => obj,
    };
    if let Some(map) = target.as_object_mut() {
        map.insert(field.to_string(), Value::String(value.to_string()));
    }
}

fn base_inputs(args: &SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut base = input::load_value(args.input.as_deref())?;
    if !base.is_object() {
        return Err("Base inputs must be a JSON/YAML object".into());
    }
    if let SensitivityModel::Continuous = args.model {
        if let Some(n) = args.simulations {
            base["num_simulations"] = Value::from(n);
        }
        let seed = args.seed.or_else(|| base["seed"].as_u64());
        base["seed"] = Value::from(resolve_seed(seed));
    }
    Ok(base)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = args.model;
    let var1 = parse_sens_var(model, &args.var1)?;
    let var2 = args
        .var2
        .as_deref()
        .map(|arg| parse_sens_var(model, arg))
        .transpose()?;
    let base = base_inputs(&args)?;
    run_with_base(model, &var1, var2.as_ref(), base)
}

fn run_with_base(
    model: SensitivityModel,
    var1: &SweepRange,
    var2: Option<&SweepRange>,
    base: Value,
) -> Result<Value, Box<dyn std::error::Error>> {
    let metric = model.metric();

    if let Some(var2) = var2 {
        let result = evaluate_grid(var1, var2, metric, |v1, v2| {
            let mut params = base.clone();
            set_json_field(&mut params, &var1.name, v1);
            set_json_field(&mut params, &var2.name, v2);
            model.evaluate(params)
        })?;
        return Ok(serde_json::to_value(result)?);
    }

    let start = Instant::now();
    let series = evaluate_sweep(var1, SweepAxis::new(&var1.name, metric), None, |v| {
        let mut params = base.clone();
        set_json_field(&mut params, &var1.name, v);
        Ok(SweepSample::new(v).with(metric, model.evaluate(params)?))
    })?;
    let warnings = series.warnings();
    let result = with_metadata_f64(
        &format!("One-way sensitivity of {metric} to {}", var1.name),
        &serde_json::json!({ "base": base, "variable": var1 }),
        warnings,
        start.elapsed().as_micros() as u64,
        series,
    );
    Ok(serde_json::to_value(result)?)
}
