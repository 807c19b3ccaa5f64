//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use crate::market::engine::{SettlementOutcome, settle};
use crate::market::ledger::{LedgerEntry, build_ledger};
use crate::market::position::build_positions;
use crate::market::report::MarketReport;
use crate::market::types::Trade;

use super::AppState;
use super::types::{ErrorResponse, SettleRequest, SettleResponse, TradesQuery};

/// Returns the full settlement ledger.
///
/// `GET /ledger` → 200 + `Vec<LedgerEntry>` JSON
pub async fn get_ledger(State(state): State<Arc<AppState>>) -> Json<Vec<LedgerEntry>> {
    Json(state.ledger.clone())
}

/// Returns one household's ledger entry.
///
/// `GET /ledger/{household_id}` → 200 + `LedgerEntry` JSON
/// Unknown household → 404 + `ErrorResponse`
pub async fn get_ledger_entry(
    State(state): State<Arc<AppState>>,
    Path(household_id): Path<String>,
) -> impl IntoResponse {
    state
        .ledger
        .iter()
        .find(|e| e.household_id == household_id)
        .map(|e| Json(e.clone()))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("no ledger entry for household \"{household_id}\""),
                }),
            )
        })
}

/// Returns executed trades, optionally filtered by counterparty.
///
/// `GET /trades` → 200 + `Vec<Trade>` JSON
/// `GET /trades?household=ID` → trades where ID is either side
pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> Json<Vec<Trade>> {
    let trades = match query.household {
        Some(ref id) => state
            .trades
            .iter()
            .filter(|t| t.involves(id))
            .cloned()
            .collect(),
        None => state.trades.clone(),
    };
    Json(trades)
}

/// Returns the run-level market report.
///
/// `GET /report` → 200 + `MarketReport` JSON
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<MarketReport> {
    Json(state.report.clone())
}

/// Settles a caller-provided snapshot with the server's configuration.
///
/// `POST /settle` → 200 + `SettleResponse` JSON
///
/// Each request builds and settles its own snapshot, so concurrent calls
/// never touch shared positions. Telemetry rejected under the strict
/// policy → 400 + `ErrorResponse`. A snapshot with households but no
/// eligible traders settles to an unsettled ledger with zero trades.
pub async fn post_settle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettleRequest>,
) -> impl IntoResponse {
    let positions = match build_positions(&request.records, &state.config) {
        Ok(positions) => positions,
        Err(e) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ));
        }
    };

    let outcome = match settle(positions.clone(), &state.config) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{e}; returning unsettled ledger");
            SettlementOutcome {
                positions,
                trades: Vec::new(),
            }
        }
    };

    let ledger = build_ledger(&outcome.positions);
    let report = MarketReport::from_settlement(&outcome.positions, &outcome.trades);
    Ok(Json(SettleResponse {
        trades: outcome.trades,
        ledger,
        report,
    }))
}
