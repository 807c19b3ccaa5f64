//! CSV export for settlement ledgers and trade lists.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::market::ledger::LedgerEntry;
use crate::market::types::Trade;

/// Schema v1 column header for ledger CSV export.
const LEDGER_HEADER: &str = "household_id,id_digest,net_kwh,traded_kwh,net_proceeds,\
                             remaining_kwh,role,eligible,overload,transformer_fault";

/// Schema v1 column header for trade CSV export.
const TRADES_HEADER: &str = "seller_id,buyer_id,kwh,price";

/// Exports the settlement ledger to a CSV file at the given path.
///
/// Writes a header row followed by one row per household. Entries arrive
/// already sorted by household id, so identical settlements export
/// byte-identical files.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_ledger_csv(entries: &[LedgerEntry], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_ledger_csv(entries, buf)
}

/// Writes the settlement ledger as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_ledger_csv(entries: &[LedgerEntry], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(LEDGER_HEADER.split(',').map(str::trim))?;

    for e in entries {
        wtr.write_record(&[
            e.household_id.clone(),
            e.id_digest.clone(),
            format!("{:.2}", e.net_kwh),
            format!("{:.2}", e.traded_kwh),
            format!("{:.3}", e.net_proceeds),
            format!("{:.2}", e.remaining_kwh),
            e.role.to_string(),
            e.eligible.to_string(),
            e.overload.to_string(),
            e.transformer_fault.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the executed trade list to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_trades_csv(trades: &[Trade], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_trades_csv(trades, buf)
}

/// Writes the executed trade list as CSV to any writer.
///
/// Trades keep execution order: bilateral matches first, then grid
/// clearings, exactly as the engine emitted them.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_trades_csv(trades: &[Trade], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TRADES_HEADER.split(','))?;

    for t in trades {
        wtr.write_record(&[
            t.seller_id.clone(),
            t.buyer_id.clone(),
            format!("{:.2}", t.kwh),
            format!("{:.3}", t.price),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
