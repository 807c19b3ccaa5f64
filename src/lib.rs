//! Local energy market settlement simulator.
//!
//! Households report surplus or deficit energy; a double-auction matching
//! engine pairs producers with consumers at negotiated prices, the grid
//! operator absorbs every residual as counterparty of last resort, and
//! the run is recorded in an auditable settlement ledger.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Seeded synthetic household telemetry generation.
pub mod fleet;
pub mod io;
/// Double-auction market core: positions, matching, grid fallback, ledger.
pub mod market;
pub mod telemetry;
