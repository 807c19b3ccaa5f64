//! Residual clearing against the grid operator.

use tracing::debug;

use crate::config::GridSection;

use super::types::{GRID_ID, HouseholdPosition, Trade};

/// Clears every leftover position against the grid at the fixed tariff.
///
/// Sellers hand residual surplus to the grid at `buy_price_per_kwh`;
/// buyers cover residual deficit at `sell_price_per_kwh`. Grid capacity
/// is unbounded, so afterwards every ranked household holds exactly zero
/// remaining energy. One trade is appended per cleared residual, sellers
/// first, both sides in rank order.
pub fn clear_residuals(
    positions: &mut [HouseholdPosition],
    sellers: &[usize],
    buyers: &[usize],
    grid: &GridSection,
    trades: &mut Vec<Trade>,
) {
    for &s in sellers {
        let residual = positions[s].remaining_kwh;
        if residual > 0.0 {
            positions[s].apply_sale(residual, grid.buy_price_per_kwh);
            debug!(
                household = %positions[s].household_id,
                kwh = residual,
                price = grid.buy_price_per_kwh,
                "residual surplus sold to grid"
            );
            trades.push(Trade::new(
                &positions[s].household_id,
                GRID_ID,
                residual,
                grid.buy_price_per_kwh,
            ));
        }
    }

    for &b in buyers {
        let residual = -positions[b].remaining_kwh;
        if residual > 0.0 {
            positions[b].apply_purchase(residual, grid.sell_price_per_kwh);
            debug!(
                household = %positions[b].household_id,
                kwh = residual,
                price = grid.sell_price_per_kwh,
                "residual deficit bought from grid"
            );
            trades.push(Trade::new(
                GRID_ID,
                &positions[b].household_id,
                residual,
                grid.sell_price_per_kwh,
            ));
        }
    }
}
