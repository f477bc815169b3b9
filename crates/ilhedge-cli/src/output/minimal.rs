use serde_json::Value;

use super::scalar;

/// Headline fields, in priority order.
const PRIORITY_KEYS: [&str; 6] = [
    "fee_breakeven_pct",
    "hedge_cost",
    "h0",
    "optimal_weight",
    "base_case_value",
    "black_scholes_hedge_cost",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object. A series prints its point count.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return format_minimal(val);
            }
        }
        if let Some(Value::Array(points)) = map.get("points") {
            return format!("{} points", points.len());
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => scalar(other),
    }
}
