use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::IlHedgeError;
use crate::IlHedgeResult;

const MAX_SWEEP_POINTS: u32 = 10_000;

/// An inclusive, evenly spaced parameter range (`linspace`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub name: String,
    pub start: Decimal,
    pub end: Decimal,
    pub points: u32,
}

impl SweepRange {
    pub fn new(name: &str, start: Decimal, end: Decimal, points: u32) -> Self {
        SweepRange {
            name: name.to_string(),
            start,
            end,
            points,
        }
    }
}

/// Axis labels carried along with a series so a renderer can title it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub x_label: String,
    pub y_label: String,
}

impl SweepAxis {
    pub fn new(x_label: &str, y_label: &str) -> Self {
        SweepAxis {
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

/// Vertical marker at the parameter value used in the reference analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    pub x: Decimal,
    pub label: String,
}

/// What an evaluator returns for one parameter value.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSample {
    /// Position on the x axis (may be a transform of the parameter, e.g. percent).
    pub x: Decimal,
    pub values: BTreeMap<String, f64>,
}

impl SweepSample {
    pub fn new(x: Decimal) -> Self {
        SweepSample {
            x,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }
}

/// One row of a series. Values are flattened so CSV output gets one column each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub parameter: Decimal,
    pub x: Decimal,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPoint {
    pub parameter: Decimal,
    pub reason: String,
}

/// Output of a one-dimensional sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSeries {
    pub parameter: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceMarker>,
    pub skipped: Vec<SkippedPoint>,
}

impl SweepSeries {
    /// Column of values for `name`, in sweep order.
    pub fn column(&self, name: &str) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.values.get(name).copied())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|s| {
                format!(
                    "{} = {} skipped: {}",
                    self.parameter, s.parameter, s.reason
                )
            })
            .collect()
    }
}

/// Evenly spaced values from `start` to `end`, both included.
pub fn linspace(range: &SweepRange) -> IlHedgeResult<Vec<Decimal>> {
    let field = format!("sweep:{}", range.name);
    if range.points == 0 {
        return Err(IlHedgeError::invalid(field, "points must be at least 1"));
    }
    if range.points > MAX_SWEEP_POINTS {
        return Err(IlHedgeError::invalid(
            field,
            format!("points must be at most {MAX_SWEEP_POINTS}"),
        ));
    }
    if range.points == 1 {
        return Ok(vec![range.start]);
    }
    if range.start > range.end {
        return Err(IlHedgeError::invalid(field, "start must be <= end"));
    }

    let intervals = Decimal::from(range.points - 1);
    let span = range
        .end
        .checked_sub(range.start)
        .ok_or_else(|| IlHedgeError::invalid(field.clone(), "range is too wide"))?;
    let step = span / intervals;
    let mut values: Vec<Decimal> = (0..range.points - 1)
        .map(|i| range.start + step * Decimal::from(i))
        .collect();
    values.push(range.end);
    Ok(values)
}

/// Evaluate `eval_fn` at every point of `range`.
///
/// A failing point does not abort the sweep; it is recorded in `skipped`.
/// The sweep only fails when no point could be evaluated.
pub fn evaluate_sweep<F>(
    range: &SweepRange,
    axis: SweepAxis,
    reference: Option<ReferenceMarker>,
    mut eval_fn: F,
) -> IlHedgeResult<SweepSeries>
where
    F: FnMut(Decimal) -> IlHedgeResult<SweepSample>,
{
    let values = linspace(range)?;
    let mut points = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();

    for parameter in values {
        match eval_fn(parameter) {
            Ok(sample) => {
                debug!(parameter = %range.name, value = %parameter, "sweep point evaluated");
                points.push(SeriesPoint {
                    parameter,
                    x: sample.x,
                    values: sample.values,
                });
            }
            Err(e) => {
                warn!(parameter = %range.name, value = %parameter, error = %e, "sweep point skipped");
                skipped.push(SkippedPoint {
                    parameter,
                    reason: e.to_string(),
                });
            }
        }
    }

    if points.is_empty() {
        return Err(IlHedgeError::InsufficientData(format!(
            "every point of the {} sweep failed",
            range.name
        )));
    }

    info!(
        parameter = %range.name,
        evaluated = points.len(),
        skipped = skipped.len(),
        "sweep complete"
    );

    Ok(SweepSeries {
        parameter: range.name.clone(),
        x_label: axis.x_label,
        y_label: axis.y_label,
        points,
        reference,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_linspace_inclusive() {
        let r = SweepRange::new("r", dec!(0), dec!(0.2), 21);
        let v = linspace(&r).unwrap();
        assert_eq!(v.len(), 21);
        assert_eq!(v[0], dec!(0));
        assert_eq!(v[1], dec!(0.01));
        assert_eq!(v[20], dec!(0.2));
    }

    #[test]
    fn test_linspace_non_terminating_step_ends_exactly() {
        let r = SweepRange::new("u", dec!(1.01), dec!(2), 100);
        let v = linspace(&r).unwrap();
        assert_eq!(v.len(), 100);
        assert_eq!(*v.last().unwrap(), dec!(2));
        assert!(v.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_linspace_single_point() {
        let r = SweepRange::new("sigma", dec!(0.5), dec!(0.1), 1);
        assert_eq!(linspace(&r).unwrap(), vec![dec!(0.5)]);
    }

    #[test]
    fn test_linspace_validation() {
        assert!(linspace(&SweepRange::new("a", dec!(0), dec!(1), 0)).is_err());
        assert!(linspace(&SweepRange::new("a", dec!(1), dec!(0), 5)).is_err());
        assert!(linspace(&SweepRange::new("a", dec!(0), dec!(1), 10_001)).is_err());
        assert!(linspace(&SweepRange::new("a", Decimal::MIN, Decimal::MAX, 3)).is_err());
    }

    #[test]
    fn test_evaluate_sweep_records_failures() {
        let r = SweepRange::new("k", dec!(-2), dec!(2), 5);
        let series = evaluate_sweep(&r, SweepAxis::new("k", "1/k"), None, |k| {
            if k.is_zero() {
                return Err(IlHedgeError::DivisionByZero {
                    context: "test".into(),
                });
            }
            Ok(SweepSample::new(k).with("inverse", 1.0 / crate::math::to_f64(k)))
        })
        .unwrap();

        assert_eq!(series.points.len(), 4);
        assert_eq!(series.skipped.len(), 1);
        assert_eq!(series.skipped[0].parameter, dec!(0));
        assert_eq!(series.warnings().len(), 1);
        assert_eq!(series.column("inverse"), vec![-0.5, -1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_evaluate_sweep_all_failed() {
        let r = SweepRange::new("k", dec!(0), dec!(1), 3);
        let result = evaluate_sweep(&r, SweepAxis::new("k", "y"), None, |_| {
            Err(IlHedgeError::FinancialImpossibility("nope".into()))
        });
        assert!(matches!(result, Err(IlHedgeError::InsufficientData(_))));
    }

    #[test]
    fn test_series_point_flattens_values() {
        let point = SeriesPoint {
            parameter: dec!(0.1),
            x: dec!(10),
            values: BTreeMap::from([("h0".to_string(), 1.5)]),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["h0"], serde_json::json!(1.5));
        assert_eq!(json["x"], serde_json::json!("10"));
    }
}
