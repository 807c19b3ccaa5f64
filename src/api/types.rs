//! API request, response, and query types.

use serde::{Deserialize, Serialize};

use crate::market::ledger::LedgerEntry;
use crate::market::report::MarketReport;
use crate::market::types::Trade;
use crate::telemetry::RawTelemetry;

/// Body for `POST /settle`: one snapshot of raw telemetry.
///
/// Records deserialize with the same gap semantics as CSV import: an
/// absent or null field becomes `None` and the server's telemetry policy
/// decides how to treat it.
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    /// Telemetry records forming the snapshot to settle.
    pub records: Vec<RawTelemetry>,
}

/// Response for `POST /settle`: the full settlement result.
#[derive(Debug, Serialize)]
pub struct SettleResponse {
    /// Executed trades in execution order.
    pub trades: Vec<Trade>,
    /// Ledger rows sorted by household id.
    pub ledger: Vec<LedgerEntry>,
    /// Run-level market summary.
    pub report: MarketReport,
}

/// Optional filter for the trades endpoint.
///
/// Unknown query parameters are rejected with 400 rather than silently
/// ignored, so a typo never returns an unfiltered list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradesQuery {
    /// Restrict to trades where this household is either counterparty.
    pub household: Option<String>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
