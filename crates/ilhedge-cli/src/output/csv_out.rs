use serde_json::Value;
use std::io;

use super::{classify, grid_rows, scalar, series_headers, ResultShape};

/// Write output as CSV to stdout. Series become one row per point so they can
/// be plotted directly.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {e}");
    }
}

fn write_csv<W: io::Write>(value: &Value, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for record in csv_records(value) {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_records(value: &Value) -> Vec<Vec<String>> {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match classify(result) {
        ResultShape::Series(points) => {
            let headers = series_headers(points);
            let mut records = vec![headers.clone()];
            for point in points {
                records.push(
                    headers
                        .iter()
                        .map(|h| point.get(h.as_str()).map(scalar).unwrap_or_default())
                        .collect(),
                );
            }
            records
        }
        ResultShape::Grid(grid) => grid_rows(grid),
        ResultShape::Record(map) => {
            let mut records = vec![vec!["field".to_string(), "value".to_string()]];
            records.extend(map.iter().map(|(k, v)| vec![k.clone(), scalar(v)]));
            records
        }
        ResultShape::Other(v) => vec![vec![scalar(v)]],
    }
}
