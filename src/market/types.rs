//! Core market types: roles, positions, and executed trades.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counterparty id used for trades settled against the grid operator.
pub const GRID_ID: &str = "grid";

/// Rounds an energy amount to two decimal places (kWh cents).
///
/// All net positions and fill bookkeeping re-round through this helper so
/// floating-point dust can never fabricate a residual micro-trade.
pub fn round_kwh(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds a price to three decimal places.
///
/// Three decimals keep the midpoint of any two two-decimal quotes exact
/// (the mean of 0.14 and 0.15 is 0.145).
pub fn round_price(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Market role derived from the sign of a household's net position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Net surplus: offers energy for sale.
    Producer,
    /// Net deficit: bids for energy.
    Consumer,
    /// Exactly zero net position; never trades.
    Balanced,
}

impl Role {
    /// Derives the role from a (rounded) net position.
    pub fn from_net_kwh(net_kwh: f64) -> Self {
        if net_kwh > 0.0 {
            Role::Producer
        } else if net_kwh < 0.0 {
            Role::Consumer
        } else {
            Role::Balanced
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Consumer => write!(f, "consumer"),
            Role::Balanced => write!(f, "balanced"),
        }
    }
}

/// Operational fault flags reported with household telemetry.
///
/// Either flag excludes the household from matching for the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFlags {
    /// Household circuit reported an overload.
    pub overload: bool,
    /// Upstream transformer reported a fault.
    pub transformer_fault: bool,
}

impl FaultFlags {
    /// True when any fault flag is set.
    pub fn any(&self) -> bool {
        self.overload || self.transformer_fault
    }
}

/// One household's market position within a settlement snapshot.
///
/// Built from telemetry by the position builder; `remaining_kwh`,
/// `traded_kwh`, and `net_proceeds` are then filled in by the matching
/// engine and grid settlement. `remaining_kwh` moves monotonically toward
/// zero and never changes sign.
///
/// # Examples
///
/// ```
/// use lem_sim::market::types::{FaultFlags, HouseholdPosition, Role};
///
/// let p = HouseholdPosition::new("H001", 4.567, 0.14, FaultFlags::default());
/// assert_eq!(p.net_kwh, 4.57);
/// assert_eq!(p.role, Role::Producer);
/// assert_eq!(p.remaining_kwh, 4.57);
/// assert_eq!(p.traded_kwh, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdPosition {
    /// Opaque household identifier, unique within a snapshot.
    pub household_id: String,
    /// Net interval energy (kWh); positive = surplus, rounded to 2 dp.
    pub net_kwh: f64,
    /// Role derived from the sign of `net_kwh`.
    pub role: Role,
    /// Price quoted for this run (currency per kWh).
    pub quoted_price: f64,
    /// Fault flags carried through from telemetry.
    pub faults: FaultFlags,
    /// Untraded energy (kWh); starts at `net_kwh`, ends at zero for
    /// every eligible household.
    pub remaining_kwh: f64,
    /// Total energy moved in either direction (kWh, non-decreasing).
    pub traded_kwh: f64,
    /// Signed money flow (currency); positive = revenue earned.
    pub net_proceeds: f64,
}

impl HouseholdPosition {
    /// Creates a fresh position from a net energy reading.
    ///
    /// Rounds `net_kwh` to two decimals and derives the role from the
    /// rounded value, so a reading inside the rounding dead band counts
    /// as balanced.
    pub fn new(household_id: &str, net_kwh: f64, quoted_price: f64, faults: FaultFlags) -> Self {
        let net_kwh = round_kwh(net_kwh);
        Self {
            household_id: household_id.to_string(),
            net_kwh,
            role: Role::from_net_kwh(net_kwh),
            quoted_price,
            faults,
            remaining_kwh: net_kwh,
            traded_kwh: 0.0,
            net_proceeds: 0.0,
        }
    }

    /// True once the position carries no untraded energy.
    pub fn is_cleared(&self) -> bool {
        self.remaining_kwh == 0.0
    }

    /// Books a sale: surplus shrinks, revenue accrues.
    ///
    /// Only the matching engine and grid settlement call this.
    pub(crate) fn apply_sale(&mut self, kwh: f64, price: f64) {
        self.remaining_kwh = round_kwh(self.remaining_kwh - kwh);
        self.traded_kwh = round_kwh(self.traded_kwh + kwh);
        self.net_proceeds += kwh * price;
    }

    /// Books a purchase: deficit shrinks, cost accrues.
    ///
    /// Only the matching engine and grid settlement call this.
    pub(crate) fn apply_purchase(&mut self, kwh: f64, price: f64) {
        self.remaining_kwh = round_kwh(self.remaining_kwh + kwh);
        self.traded_kwh = round_kwh(self.traded_kwh + kwh);
        self.net_proceeds -= kwh * price;
    }
}

/// One executed trade; immutable once recorded.
///
/// Either side may be [`GRID_ID`] when the grid acts as counterparty of
/// last resort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Selling party (household id or [`GRID_ID`]).
    pub seller_id: String,
    /// Buying party (household id or [`GRID_ID`]).
    pub buyer_id: String,
    /// Energy transferred (kWh, always positive).
    pub kwh: f64,
    /// Clearing price (currency per kWh).
    pub price: f64,
}

impl Trade {
    /// Records a trade between two parties.
    ///
    /// # Panics
    ///
    /// Panics if `kwh` is not strictly positive; zero-quantity trades are
    /// a bookkeeping bug, never a market outcome.
    pub fn new(seller_id: &str, buyer_id: &str, kwh: f64, price: f64) -> Self {
        assert!(kwh > 0.0, "trade quantity must be > 0");
        Self {
            seller_id: seller_id.to_string(),
            buyer_id: buyer_id.to_string(),
            kwh,
            price,
        }
    }

    /// True when either side of the trade is the grid operator.
    pub fn involves_grid(&self) -> bool {
        self.seller_id == GRID_ID || self.buyer_id == GRID_ID
    }

    /// True when the given household is a counterparty.
    pub fn involves(&self, household_id: &str) -> bool {
        self.seller_id == household_id || self.buyer_id == household_id
    }

    /// Money moved by this trade (currency).
    pub fn value(&self) -> f64 {
        self.kwh * self.price
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}  {:.2} kWh @ {:.3}",
            self.seller_id, self.buyer_id, self.kwh, self.price
        )
    }
}
