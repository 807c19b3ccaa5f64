//! Run-level market summary computed from a settled snapshot.

use std::fmt;

use serde::Serialize;

use super::eligibility::is_eligible;
use super::types::{HouseholdPosition, Role, Trade};

/// Aggregate market indicators for one settlement run.
///
/// Computed post-hoc from the settled positions and the executed trade
/// list so the summary always agrees with the ledger it accompanies.
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    /// Households in the snapshot.
    pub households: usize,
    /// Households with net surplus.
    pub producers: usize,
    /// Households with net deficit.
    pub consumers: usize,
    /// Households with exactly zero net position.
    pub balanced: usize,
    /// Households excluded from matching (faulted or balanced).
    pub excluded: usize,
    /// Executed household-to-household trades.
    pub bilateral_trades: usize,
    /// Energy moved between households (kWh).
    pub bilateral_kwh: f64,
    /// Executed grid fallback trades.
    pub grid_trades: usize,
    /// Residual deficit covered by the grid (kWh).
    pub grid_import_kwh: f64,
    /// Residual surplus absorbed by the grid (kWh).
    pub grid_export_kwh: f64,
    /// Volume-weighted average bilateral clearing price (currency/kWh).
    pub avg_clearing_price: f64,
    /// Money moved across all trades (currency).
    pub turnover: f64,
    /// Share of traded energy that stayed between households (0.0 to 1.0).
    pub self_consumption_share: f64,
}

impl MarketReport {
    /// Computes the report from settled positions and executed trades.
    pub fn from_settlement(positions: &[HouseholdPosition], trades: &[Trade]) -> Self {
        let mut producers = 0_usize;
        let mut consumers = 0_usize;
        let mut balanced = 0_usize;
        let mut excluded = 0_usize;
        for p in positions {
            match p.role {
                Role::Producer => producers += 1,
                Role::Consumer => consumers += 1,
                Role::Balanced => balanced += 1,
            }
            if !is_eligible(p) {
                excluded += 1;
            }
        }

        let mut bilateral_trades = 0_usize;
        let mut bilateral_kwh = 0.0_f64;
        let mut bilateral_value = 0.0_f64;
        let mut grid_trades = 0_usize;
        let mut grid_import_kwh = 0.0_f64;
        let mut grid_export_kwh = 0.0_f64;
        let mut turnover = 0.0_f64;
        for t in trades {
            turnover += t.value();
            if t.involves_grid() {
                grid_trades += 1;
                if t.seller_id == super::types::GRID_ID {
                    grid_import_kwh += t.kwh;
                } else {
                    grid_export_kwh += t.kwh;
                }
            } else {
                bilateral_trades += 1;
                bilateral_kwh += t.kwh;
                bilateral_value += t.value();
            }
        }

        let avg_clearing_price = if bilateral_kwh > 0.0 {
            bilateral_value / bilateral_kwh
        } else {
            0.0
        };

        let total_kwh = bilateral_kwh + grid_import_kwh + grid_export_kwh;
        let self_consumption_share = if total_kwh > 0.0 {
            bilateral_kwh / total_kwh
        } else {
            0.0
        };

        Self {
            households: positions.len(),
            producers,
            consumers,
            balanced,
            excluded,
            bilateral_trades,
            bilateral_kwh,
            grid_trades,
            grid_import_kwh,
            grid_export_kwh,
            avg_clearing_price,
            turnover,
            self_consumption_share,
        }
    }
}

impl fmt::Display for MarketReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Market Report ---")?;
        writeln!(
            f,
            "Households:          {} ({} producers, {} consumers, {} balanced, {} excluded)",
            self.households, self.producers, self.consumers, self.balanced, self.excluded
        )?;
        writeln!(
            f,
            "Bilateral trades:    {} ({:.2} kWh)",
            self.bilateral_trades, self.bilateral_kwh
        )?;
        writeln!(
            f,
            "Grid import:         {:.2} kWh over {} grid trade(s)",
            self.grid_import_kwh, self.grid_trades
        )?;
        writeln!(f, "Grid export:         {:.2} kWh", self.grid_export_kwh)?;
        writeln!(
            f,
            "Avg clearing price:  {:.3}/kWh",
            self.avg_clearing_price
        )?;
        writeln!(f, "Turnover:            {:.3}", self.turnover)?;
        write!(
            f,
            "Self-consumption:    {:.1}%",
            self.self_consumption_share * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::{FaultFlags, GRID_ID};

    fn position(id: &str, net_kwh: f64) -> HouseholdPosition {
        HouseholdPosition::new(id, net_kwh, 0.14, FaultFlags::default())
    }

    #[test]
    fn empty_settlement_reports_zeroes() {
        let report = MarketReport::from_settlement(&[], &[]);
        assert_eq!(report.households, 0);
        assert_eq!(report.bilateral_trades, 0);
        assert_eq!(report.avg_clearing_price, 0.0);
        assert_eq!(report.self_consumption_share, 0.0);
    }

    #[test]
    fn role_and_exclusion_counts() {
        let faults = FaultFlags {
            overload: true,
            transformer_fault: false,
        };
        let positions = vec![
            position("H001", 5.0),
            position("H002", -3.0),
            position("H003", 0.0),
            HouseholdPosition::new("H004", 2.0, 0.14, faults),
        ];
        let report = MarketReport::from_settlement(&positions, &[]);
        assert_eq!(report.households, 4);
        assert_eq!(report.producers, 2);
        assert_eq!(report.consumers, 1);
        assert_eq!(report.balanced, 1);
        // Balanced and faulted households are both excluded.
        assert_eq!(report.excluded, 2);
    }

    #[test]
    fn trade_volumes_split_by_counterparty() {
        let trades = vec![
            Trade::new("H001", "H002", 3.0, 0.145),
            Trade::new("H001", GRID_ID, 2.0, 0.13),
            Trade::new(GRID_ID, "H003", 1.0, 0.15),
        ];
        let report = MarketReport::from_settlement(&[], &trades);
        assert_eq!(report.bilateral_trades, 1);
        assert!((report.bilateral_kwh - 3.0).abs() < 1e-9);
        assert_eq!(report.grid_trades, 2);
        assert!((report.grid_export_kwh - 2.0).abs() < 1e-9);
        assert!((report.grid_import_kwh - 1.0).abs() < 1e-9);
    }

    #[test]
    fn avg_price_is_volume_weighted() {
        let trades = vec![
            Trade::new("H001", "H002", 3.0, 0.14),
            Trade::new("H003", "H004", 1.0, 0.18),
        ];
        let report = MarketReport::from_settlement(&[], &trades);
        // (3*0.14 + 1*0.18) / 4
        assert!((report.avg_clearing_price - 0.15).abs() < 1e-9);
    }

    #[test]
    fn turnover_sums_all_trade_values() {
        let trades = vec![
            Trade::new("H001", "H002", 3.0, 0.145),
            Trade::new("H001", GRID_ID, 2.0, 0.13),
        ];
        let report = MarketReport::from_settlement(&[], &trades);
        assert!((report.turnover - (0.435 + 0.26)).abs() < 1e-9);
    }

    #[test]
    fn self_consumption_share_of_traded_energy() {
        let trades = vec![
            Trade::new("H001", "H002", 3.0, 0.145),
            Trade::new("H001", GRID_ID, 1.0, 0.13),
        ];
        let report = MarketReport::from_settlement(&[], &trades);
        assert!((report.self_consumption_share - 0.75).abs() < 1e-9);
    }

    #[test]
    fn display_does_not_panic() {
        let trades = vec![Trade::new("H001", "H002", 3.0, 0.145)];
        let report = MarketReport::from_settlement(&[position("H001", 3.0)], &trades);
        let text = format!("{report}");
        assert!(text.contains("Market Report"));
        assert!(text.contains("Self-consumption"));
    }
}
