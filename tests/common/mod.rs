//! Shared test fixtures for integration tests.

use lem_sim::config::MarketConfig;
use lem_sim::market::types::{FaultFlags, HouseholdPosition};
use lem_sim::telemetry::RawTelemetry;

/// Baseline configuration with pass-through pricing, so test positions
/// trade at exactly the quotes the fixtures assign.
pub fn quoted_config() -> MarketConfig {
    let mut cfg = MarketConfig::baseline();
    cfg.market.pricing = "quoted".to_string();
    cfg
}

/// Fault-free position with the given net energy and quote.
pub fn position(id: &str, net_kwh: f64, quoted_price: f64) -> HouseholdPosition {
    HouseholdPosition::new(id, net_kwh, quoted_price, FaultFlags::default())
}

/// Position excluded from trading by an overload fault.
pub fn overloaded(id: &str, net_kwh: f64, quoted_price: f64) -> HouseholdPosition {
    let faults = FaultFlags {
        overload: true,
        transformer_fault: false,
    };
    HouseholdPosition::new(id, net_kwh, quoted_price, faults)
}

/// Telemetry record that nets out to `net_kwh` (solar covers surplus,
/// consumption covers deficit).
pub fn telemetry(id: &str, net_kwh: f64, quoted_price: f64) -> RawTelemetry {
    if net_kwh >= 0.0 {
        RawTelemetry::new(id, net_kwh, 0.0, 0.0, quoted_price)
    } else {
        RawTelemetry::new(id, 0.0, 0.0, -net_kwh, quoted_price)
    }
}
