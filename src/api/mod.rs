//! REST API over one settlement run.
//!
//! Read endpoints serve the run the server was started from:
//! - `/ledger`, `/ledger/{household_id}` — settlement ledger rows
//! - `/trades` — executed trades, filterable by counterparty
//! - `/report` — run-level market summary
//!
//! `POST /settle` settles a caller-provided telemetry snapshot with the
//! server's configuration. Each request owns its snapshot, so concurrent
//! calls never share mutable positions.

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::config::MarketConfig;
use crate::market::ledger::LedgerEntry;
use crate::market::report::MarketReport;
use crate::market::types::Trade;

/// Immutable application state shared across all request handlers.
///
/// Constructed once from a finished settlement run and wrapped in `Arc`
/// — no locks needed since all data is read-only.
pub struct AppState {
    /// Market configuration; reused to settle `POST /settle` snapshots.
    pub config: MarketConfig,
    /// Settlement ledger sorted by household id.
    pub ledger: Vec<LedgerEntry>,
    /// Executed trades in execution order.
    pub trades: Vec<Trade>,
    /// Run-level market summary.
    pub report: MarketReport,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ledger", get(handlers::get_ledger))
        .route("/ledger/{household_id}", get(handlers::get_ledger_entry))
        .route("/trades", get(handlers::get_trades))
        .route("/report", get(handlers::get_report))
        .route("/settle", post(handlers::post_settle))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
