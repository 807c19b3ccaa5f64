//! Builds per-household market positions from raw telemetry.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::warn;

use crate::config::{GridSection, MarketConfig};
use crate::telemetry::{RawTelemetry, TelemetryPolicy};

use super::types::{FaultFlags, HouseholdPosition, Role, round_kwh, round_price};

/// How quoted prices are assigned to positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingPolicy {
    /// Pass each household's reported price through unchanged.
    Quoted,
    /// Draw prices from seeded uniform bands around the grid tariff.
    Randomized {
        /// RNG seed; a fresh generator is built per run so identical
        /// snapshots price identically.
        seed: u64,
    },
}

/// Telemetry rejection raised under [`TelemetryPolicy::Strict`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// A required numeric field is missing or unparseable.
    #[error("household {household_id}: missing or non-numeric field `{field}`")]
    MalformedTelemetry {
        /// Household the bad record belongs to.
        household_id: String,
        /// Name of the offending field.
        field: &'static str,
    },
    /// A record carries no household id to attach data to.
    #[error("telemetry record {index} has an empty household id")]
    MissingHouseholdId {
        /// Zero-based record index within the snapshot.
        index: usize,
    },
}

/// Builds one position per telemetry record.
///
/// Net energy is `solar + wind - consumption`, rounded to two decimals;
/// the role follows the sign of the rounded value. Numeric gaps are
/// zero-filled with a warning or rejected, per the configured telemetry
/// policy; missing fault flags always default to no-fault. Quoted prices
/// come from the records or from seeded draws, per the configured pricing
/// policy.
///
/// # Errors
///
/// Returns a [`TelemetryError`] only under [`TelemetryPolicy::Strict`];
/// zero-fill mode recovers from every field-level gap. A record with an
/// empty household id is skipped (zero-fill) or rejected (strict), since
/// an id cannot be substituted.
pub fn build_positions(
    records: &[RawTelemetry],
    config: &MarketConfig,
) -> Result<Vec<HouseholdPosition>, TelemetryError> {
    let policy = config.telemetry_policy();
    let mut rng = match config.pricing_policy() {
        PricingPolicy::Randomized { seed } => Some(StdRng::seed_from_u64(seed)),
        PricingPolicy::Quoted => None,
    };

    let mut positions = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if record.household_id.is_empty() {
            match policy {
                TelemetryPolicy::ZeroFill => {
                    warn!(index, "skipping telemetry record with empty household id");
                    continue;
                }
                TelemetryPolicy::Strict => {
                    return Err(TelemetryError::MissingHouseholdId { index });
                }
            }
        }
        let id = record.household_id.as_str();

        let solar = numeric_field(id, "solar_kwh", record.solar_kwh, policy)?;
        let wind = numeric_field(id, "wind_kwh", record.wind_kwh, policy)?;
        let consumption = numeric_field(id, "consumption_kwh", record.consumption_kwh, policy)?;

        let net_kwh = round_kwh(solar + wind - consumption);
        let role = Role::from_net_kwh(net_kwh);

        let quoted_price = match rng.as_mut() {
            Some(rng) => draw_price(rng, role, &config.grid),
            None => numeric_field(id, "quoted_price", record.quoted_price, policy)?,
        };

        let faults = FaultFlags {
            overload: record.overload.unwrap_or(false),
            transformer_fault: record.transformer_fault.unwrap_or(false),
        };

        positions.push(HouseholdPosition::new(id, net_kwh, quoted_price, faults));
    }

    Ok(positions)
}

/// Resolves an optional numeric field per the telemetry policy.
///
/// Non-finite values (a CSV cell of `NaN` parses successfully) count as
/// malformed.
fn numeric_field(
    household_id: &str,
    field: &'static str,
    value: Option<f64>,
    policy: TelemetryPolicy,
) -> Result<f64, TelemetryError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => match policy {
            TelemetryPolicy::ZeroFill => {
                warn!(household_id, field, "zero-filling missing telemetry field");
                Ok(0.0)
            }
            TelemetryPolicy::Strict => Err(TelemetryError::MalformedTelemetry {
                household_id: household_id.to_string(),
                field,
            }),
        },
    }
}

/// Draws a quoted price for the given role from the configured bands.
///
/// Sellers quote inside the grid spread, buyers at or above the grid sell
/// price, so a bilateral match always beats the grid for both sides.
/// Config validation guarantees both bands are non-empty. Balanced
/// households never trade; they carry the grid sell price as a placeholder.
fn draw_price(rng: &mut StdRng, role: Role, grid: &GridSection) -> f64 {
    // Band endpoints are re-rounded to price precision so floating-point
    // dust in `buy + margin` can never invert a band that is nominally
    // non-empty (0.13 + 0.01 lands a ulp above 0.15 - 0.01 in f64).
    let price = match role {
        Role::Producer => {
            let lo = round_price(grid.buy_price_per_kwh + grid.seller_margin);
            let hi = round_price(grid.sell_price_per_kwh - grid.seller_margin);
            rng.random_range(lo..=hi)
        }
        Role::Consumer => {
            let lo = grid.sell_price_per_kwh;
            let hi = round_price(grid.sell_price_per_kwh + grid.buyer_margin);
            rng.random_range(lo..=hi)
        }
        Role::Balanced => grid.sell_price_per_kwh,
    };
    round_price(price)
}
