use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::series::{linspace, SweepRange};
use crate::error::IlHedgeError;
use crate::types::*;
use crate::IlHedgeResult;

/// Output of a two-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: String,
    /// matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j].
    /// `None` where the model could not be evaluated.
    pub matrix: Vec<Vec<Option<f64>>>,
    pub base_case_value: Option<f64>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate a two-way sensitivity grid using a provided computation function.
///
/// The `eval_fn` receives (variable_1_value, variable_2_value) and returns
/// the output metric value.
pub fn evaluate_grid<F>(
    variable_1: &SweepRange,
    variable_2: &SweepRange,
    output_metric: &str,
    mut eval_fn: F,
) -> IlHedgeResult<ComputationOutput<SensitivityGrid>>
where
    F: FnMut(Decimal, Decimal) -> IlHedgeResult<f64>,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let v1_values = linspace(variable_1)?;
    let v2_values = linspace(variable_2)?;

    let mut matrix = Vec::with_capacity(v1_values.len());
    let mut evaluated = 0usize;

    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            match eval_fn(*v1, *v2) {
                Ok(val) => {
                    debug!(%v1, %v2, value = val, "grid cell evaluated");
                    evaluated += 1;
                    row.push(Some(val));
                }
                Err(e) => {
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    row.push(None);
                }
            }
        }
        matrix.push(row);
    }

    if evaluated == 0 {
        return Err(IlHedgeError::InsufficientData(format!(
            "no cell of the {} x {} grid could be evaluated",
            variable_1.name, variable_2.name
        )));
    }

    let mid1 = variable_1.start / dec!(2) + variable_1.end / dec!(2);
    let mid2 = variable_2.start / dec!(2) + variable_2.end / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    info!(
        rows = v1_values.len(),
        cols = v2_values.len(),
        failed = warnings.len(),
        "sensitivity grid complete"
    );

    let output = SensitivityGrid {
        variable_1_name: variable_1.name.clone(),
        variable_2_name: variable_2.name.clone(),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        output_metric: output_metric.to_string(),
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "2-Way Sensitivity Analysis",
        &serde_json::json!({
            "variable_1": variable_1,
            "variable_2": variable_2,
            "output_metric": output_metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::to_f64;
    use pretty_assertions::assert_eq;

    fn rate_range() -> SweepRange {
        SweepRange::new("risk_free_rate", dec!(0), dec!(0.2), 5)
    }

    fn up_factor_range() -> SweepRange {
        SweepRange::new("up_factor", dec!(1.05), dec!(1.45), 5)
    }

    /// Risk-neutral up probability; no price exists unless 1/u < 1 + r < u.
    fn pi_up(r: Decimal, u: Decimal) -> IlHedgeResult<f64> {
        let growth = Decimal::ONE + r;
        let d = Decimal::ONE / u;
        if growth <= d || growth >= u {
            return Err(IlHedgeError::FinancialImpossibility(format!(
                "arbitrage at u = {u}, r = {r}"
            )));
        }
        Ok(to_f64((growth - d) / (u - d)))
    }

    #[test]
    fn test_grid_dimensions_and_base_case() {
        let result = evaluate_grid(&rate_range(), &up_factor_range(), "pi_up", pi_up).unwrap();
        let out = &result.result;
        assert_eq!(out.matrix.len(), 5);
        assert_eq!(out.matrix[0].len(), 5);
        assert_eq!(out.base_case_position, (2, 2));
        // r = 10%, u = 1.25: (1.1 - 0.8) / (1.25 - 0.8)
        let base = out.base_case_value.unwrap();
        assert!((base - 2.0 / 3.0).abs() < 1e-12, "base={base}");
    }

    #[test]
    fn test_grid_arbitrage_cells_are_none() {
        let result = evaluate_grid(&rate_range(), &up_factor_range(), "pi_up", pi_up).unwrap();
        let out = &result.result;
        // At r = 0 every up factor is arbitrage free
        assert!(out.matrix[0].iter().all(|c| c.is_some()));
        // At r = 20% the growth factor 1.2 is not below u = 1.05 or 1.15
        assert!(out.matrix[4][0].is_none());
        assert!(out.matrix[4][1].is_none());
        assert!(out.matrix[4][2].is_some());
        assert_eq!(result.warnings.len(), 6);
    }

    #[test]
    fn test_grid_base_case_can_fail() {
        let rates = SweepRange::new("risk_free_rate", dec!(0.2), dec!(0.3), 5);
        let result = evaluate_grid(&rates, &up_factor_range(), "pi_up", pi_up).unwrap();
        // r = 25% at u = 1.25 sits on the no-arbitrage bound
        assert!(result.result.base_case_value.is_none());
    }

    #[test]
    fn test_grid_all_failed() {
        let result = evaluate_grid(&rate_range(), &up_factor_range(), "x", |_, _| {
            Err(IlHedgeError::InsufficientData("none".into()))
        });
        assert!(result.is_err());
    }
}
