//! Double-auction market core: positions, matching, grid fallback, ledger.

/// Trading eligibility rules.
pub mod eligibility;
pub mod engine;
/// Residual clearing against the grid operator.
pub mod grid;
pub mod ledger;
/// Position builder turning telemetry into market positions.
pub mod position;
pub mod rank;
pub mod report;
pub mod types;

// Re-export the main types for convenience
pub use engine::{SettleError, SettlementOutcome, settle};
pub use ledger::{LedgerEntry, build_ledger};
pub use position::{PricingPolicy, TelemetryError, build_positions};
pub use report::MarketReport;
pub use types::{FaultFlags, HouseholdPosition, Role, Trade};
