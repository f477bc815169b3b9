pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-printed envelope on stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

/// Shape of a `result` payload, as far as the tabular formatters care.
pub(crate) enum ResultShape<'a> {
    /// A sweep: rows of `{parameter, x, <metric>...}`
    Series(&'a [Value]),
    /// A two-way sensitivity grid
    Grid(&'a Map<String, Value>),
    Record(&'a Map<String, Value>),
    Other(&'a Value),
}

pub(crate) fn classify(result: &Value) -> ResultShape<'_> {
    match result {
        Value::Object(map) => match map.get("points") {
            Some(Value::Array(points)) => ResultShape::Series(points),
            _ if map.contains_key("matrix") => ResultShape::Grid(map),
            _ => ResultShape::Record(map),
        },
        other => ResultShape::Other(other),
    }
}

/// Column order for series rows: the swept parameter, the x coordinate, then
/// every metric.
pub(crate) fn series_headers(points: &[Value]) -> Vec<String> {
    let mut headers = vec!["parameter".to_string(), "x".to_string()];
    if let Some(Value::Object(first)) = points.first() {
        headers.extend(
            first
                .keys()
                .filter(|k| k.as_str() != "parameter" && k.as_str() != "x")
                .cloned(),
        );
    }
    headers
}

/// Grid as rows: header row of variable_2 values, one row per variable_1 value.
pub(crate) fn grid_rows(grid: &Map<String, Value>) -> Vec<Vec<String>> {
    let name1 = grid
        .get("variable_1_name")
        .and_then(Value::as_str)
        .unwrap_or("variable_1");
    let name2 = grid
        .get("variable_2_name")
        .and_then(Value::as_str)
        .unwrap_or("variable_2");
    let empty = Vec::new();
    let values1 = grid
        .get("variable_1_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let values2 = grid
        .get("variable_2_values")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    let mut rows = Vec::with_capacity(values1.len() + 1);
    let mut header = vec![format!("{name1} \\ {name2}")];
    header.extend(values2.iter().map(scalar));
    rows.push(header);

    for (v1, row) in values1.iter().zip(matrix) {
        let mut line = vec![scalar(v1)];
        if let Value::Array(cells) = row {
            line.extend(cells.iter().map(scalar));
        }
        rows.push(line);
    }
    rows
}

/// Scalar rendering shared by the tabular formatters; null prints empty.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_series_headers_lead_with_parameter_and_x() {
        let points = vec![json!({"parameter": "0.1", "x": "10", "h0": 1.0, "analytic_h0": 1.1})];
        assert_eq!(
            series_headers(&points),
            vec!["parameter", "x", "analytic_h0", "h0"]
        );
    }

    #[test]
    fn test_grid_rows() {
        let grid = json!({
            "variable_1_name": "r",
            "variable_2_name": "u",
            "variable_1_values": ["0", "0.1"],
            "variable_2_values": ["1.1", "1.5"],
            "matrix": [[1.0, 2.0], [null, 3.5]],
        });
        let rows = grid_rows(grid.as_object().unwrap());
        assert_eq!(rows[0], vec!["r \\ u", "1.1", "1.5"]);
        assert_eq!(rows[2], vec!["0.1", "", "3.5"]);
    }

    #[test]
    fn test_classify() {
        assert!(matches!(classify(&json!({"points": []})), ResultShape::Series(_)));
        assert!(matches!(classify(&json!({"matrix": []})), ResultShape::Grid(_)));
        assert!(matches!(classify(&json!({"h0": 1.0})), ResultShape::Record(_)));
        assert!(matches!(classify(&json!(3)), ResultShape::Other(_)));
    }
}
