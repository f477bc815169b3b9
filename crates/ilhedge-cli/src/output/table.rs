use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{classify, grid_rows, scalar, series_headers, ResultShape};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_table(result, map),
            None => print_record(map),
        },
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match classify(result) {
        ResultShape::Series(points) => print_series(result, points),
        ResultShape::Grid(grid) => {
            if let Some(metric) = grid.get("output_metric").and_then(Value::as_str) {
                println!("{metric}");
            }
            print_rows(grid_rows(grid));
        }
        ResultShape::Record(map) => print_record(map),
        ResultShape::Other(v) => println!("{}", scalar(v)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_series(series: &Value, points: &[Value]) {
    if let (Some(x), Some(y)) = (
        series.get("x_label").and_then(Value::as_str),
        series.get("y_label").and_then(Value::as_str),
    ) {
        println!("x: {x}\ny: {y}");
    }
    if points.is_empty() {
        println!("(empty)");
    } else {
        let headers = series_headers(points);
        let mut rows = vec![headers.clone()];
        for point in points {
            rows.push(
                headers
                    .iter()
                    .map(|h| point.get(h.as_str()).map(scalar).unwrap_or_default())
                    .collect(),
            );
        }
        print_rows(rows);
    }
    if let Some(reference) = series.get("reference").filter(|r| !r.is_null()) {
        println!(
            "\nReference: x = {} ({})",
            reference.get("x").map(scalar).unwrap_or_default(),
            reference.get("label").map(scalar).unwrap_or_default()
        );
    }
}

fn print_rows(rows: Vec<Vec<String>>) {
    let mut builder = Builder::default();
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_record(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        other => scalar(other),
    }
}
