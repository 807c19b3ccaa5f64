//! CSV import for household telemetry.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::telemetry::RawTelemetry;

/// Reads telemetry records from a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened or is not valid
/// CSV, or if the `household_id` column is missing.
pub fn import_telemetry_csv(path: &Path) -> io::Result<Vec<RawTelemetry>> {
    let file = File::open(path)?;
    read_telemetry(io::BufReader::new(file))
}

/// Reads telemetry records as CSV from any reader.
///
/// Columns are addressed by header name, so column order is free and
/// unknown columns are ignored. A cell that is absent, empty, or fails to
/// parse becomes `None` in the record; the position builder's telemetry
/// policy decides later whether that is recoverable. Only a missing
/// `household_id` column fails the whole import, since no record can be
/// attributed without it.
///
/// # Errors
///
/// Returns an `io::Error` of kind `InvalidData` when the header has no
/// `household_id` column, or the underlying CSV error for malformed input.
pub fn read_telemetry(reader: impl Read) -> io::Result<Vec<RawTelemetry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let id_col = column("household_id").ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "telemetry CSV has no `household_id` column",
        )
    })?;
    let solar_col = column("solar_kwh");
    let wind_col = column("wind_kwh");
    let consumption_col = column("consumption_kwh");
    let price_col = column("quoted_price");
    let overload_col = column("overload");
    let transformer_col = column("transformer_fault");

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(RawTelemetry {
            household_id: row.get(id_col).unwrap_or_default().to_string(),
            solar_kwh: numeric_cell(&row, solar_col),
            wind_kwh: numeric_cell(&row, wind_col),
            consumption_kwh: numeric_cell(&row, consumption_col),
            quoted_price: numeric_cell(&row, price_col),
            overload: flag_cell(&row, overload_col),
            transformer_fault: flag_cell(&row, transformer_col),
        });
    }
    Ok(records)
}

fn numeric_cell(row: &csv::StringRecord, col: Option<usize>) -> Option<f64> {
    col.and_then(|i| row.get(i)).and_then(|cell| cell.parse().ok())
}

/// Fault flags arrive as `0`/`1` from meters and `true`/`false` from
/// files edited by hand; anything else is treated as not reported.
fn flag_cell(row: &csv::StringRecord, col: Option<usize>) -> Option<bool> {
    col.and_then(|i| row.get(i))
        .and_then(|cell| match cell.to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        })
}
