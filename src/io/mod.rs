//! CSV import and export for telemetry, ledgers, and trades.

/// Ledger and trade list CSV writers.
pub mod export;
/// Telemetry CSV reader with per-field tolerant parsing.
pub mod import;
