//! Double-auction matching engine and snapshot settlement.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MarketConfig;

use super::grid::clear_residuals;
use super::rank::{rank_buyers, rank_sellers};
use super::types::{HouseholdPosition, Trade, round_price};

/// Final state of one settlement run.
///
/// Trades are ordered deterministically: bilateral matches in execution
/// order, then grid clearings in rank order.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// All input positions with filled bookkeeping fields.
    pub positions: Vec<HouseholdPosition>,
    /// Executed trades.
    pub trades: Vec<Trade>,
}

/// Settlement rejection for snapshots that cannot trade at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    /// The snapshot has households but none are eligible to trade.
    #[error("snapshot has {total} households but none are eligible to trade")]
    EmptySnapshot {
        /// Total households in the rejected snapshot.
        total: usize,
    },
}

/// Settles one snapshot of household positions.
///
/// Ranked sellers are matched against ranked buyers wherever the buyer's
/// quote meets the seller's ask; each match moves the overlapping
/// quantity at the midpoint of the two quotes. Residual energy is then
/// cleared against the grid, so every eligible household leaves with zero
/// remaining energy. The snapshot is consumed and returned updated;
/// callers never observe a partially settled state.
///
/// An empty input settles to an empty outcome. Identical inputs settle to
/// identical outcomes: ranking, matching, and grid clearing are all
/// deterministic.
///
/// # Errors
///
/// Returns [`SettleError::EmptySnapshot`] when the input is non-empty but
/// no household is eligible; callers are expected to report the untraded
/// ledger rather than abort.
pub fn settle(
    mut positions: Vec<HouseholdPosition>,
    config: &MarketConfig,
) -> Result<SettlementOutcome, SettleError> {
    if positions.is_empty() {
        return Ok(SettlementOutcome {
            positions,
            trades: Vec::new(),
        });
    }

    let sellers = rank_sellers(&positions);
    let buyers = rank_buyers(&positions);
    if sellers.is_empty() && buyers.is_empty() {
        warn!(
            households = positions.len(),
            "snapshot has no eligible households"
        );
        return Err(SettleError::EmptySnapshot {
            total: positions.len(),
        });
    }

    let mut trades = match_bilateral(&mut positions, &sellers, &buyers);
    let bilateral = trades.len();
    clear_residuals(&mut positions, &sellers, &buyers, &config.grid, &mut trades);

    info!(
        households = positions.len(),
        sellers = sellers.len(),
        buyers = buyers.len(),
        bilateral,
        grid = trades.len() - bilateral,
        "snapshot settled"
    );

    Ok(SettlementOutcome { positions, trades })
}

/// Runs the bilateral double-auction pass and returns executed trades.
///
/// Each seller scans buyers in rank order, trading with every
/// price-compatible buyer until its surplus is exhausted. One full pass
/// reaches the fixpoint: a seller only stops early by clearing, and later
/// activity only moves buyers toward zero, so no compatible pair with
/// nonzero remaining energy survives the pass.
fn match_bilateral(
    positions: &mut [HouseholdPosition],
    sellers: &[usize],
    buyers: &[usize],
) -> Vec<Trade> {
    let mut trades = Vec::new();

    for &s in sellers {
        for &b in buyers {
            if positions[s].remaining_kwh <= 0.0 {
                break;
            }
            if positions[b].remaining_kwh >= 0.0 {
                continue;
            }
            // Buyer must meet the seller's ask; an incompatible pair is a
            // normal no-match and the residue falls through to the grid.
            if positions[b].quoted_price < positions[s].quoted_price {
                continue;
            }

            let kwh = positions[s].remaining_kwh.min(-positions[b].remaining_kwh);
            let price = round_price((positions[s].quoted_price + positions[b].quoted_price) / 2.0);

            positions[s].apply_sale(kwh, price);
            positions[b].apply_purchase(kwh, price);

            debug!(
                seller = %positions[s].household_id,
                buyer = %positions[b].household_id,
                kwh,
                price,
                "bilateral match"
            );
            trades.push(Trade::new(
                &positions[s].household_id,
                &positions[b].household_id,
                kwh,
                price,
            ));
        }
    }

    trades
}
