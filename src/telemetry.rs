//! Raw telemetry records as reported by households.

use serde::{Deserialize, Serialize};

/// One interval telemetry report from a single household.
///
/// Numeric fields and fault flags are `Option` because field-level gaps
/// are a normal input condition: a value that is missing or failed to
/// parse arrives as `None`, and the position builder's
/// [`TelemetryPolicy`] decides whether to zero-fill or reject it. The
/// reader never hard-fails on a single bad cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTelemetry {
    /// Opaque household identifier, unique within a snapshot.
    pub household_id: String,
    /// Solar generation over the interval (kWh).
    #[serde(default)]
    pub solar_kwh: Option<f64>,
    /// Wind generation over the interval (kWh).
    #[serde(default)]
    pub wind_kwh: Option<f64>,
    /// Consumption over the interval (kWh).
    #[serde(default)]
    pub consumption_kwh: Option<f64>,
    /// Price the household quotes for this run (currency per kWh).
    #[serde(default)]
    pub quoted_price: Option<f64>,
    /// Overload fault flag; absent means no fault reported.
    #[serde(default)]
    pub overload: Option<bool>,
    /// Transformer fault flag; absent means no fault reported.
    #[serde(default)]
    pub transformer_fault: Option<bool>,
}

impl RawTelemetry {
    /// Creates a fully populated, fault-free record.
    pub fn new(
        household_id: &str,
        solar_kwh: f64,
        wind_kwh: f64,
        consumption_kwh: f64,
        quoted_price: f64,
    ) -> Self {
        Self {
            household_id: household_id.to_string(),
            solar_kwh: Some(solar_kwh),
            wind_kwh: Some(wind_kwh),
            consumption_kwh: Some(consumption_kwh),
            quoted_price: Some(quoted_price),
            overload: Some(false),
            transformer_fault: Some(false),
        }
    }

    /// Sets both fault flags, consuming and returning the record.
    pub fn with_faults(mut self, overload: bool, transformer_fault: bool) -> Self {
        self.overload = Some(overload);
        self.transformer_fault = Some(transformer_fault);
        self
    }
}

/// How the position builder treats missing or unparseable numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryPolicy {
    /// Substitute 0.0 for the field and log a warning (default).
    ZeroFill,
    /// Reject the snapshot with a telemetry error.
    Strict,
}
