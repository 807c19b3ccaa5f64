//! Settlement ledger projection.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::eligibility::is_eligible;
use super::types::{HouseholdPosition, Role};

/// One settled ledger row per household.
///
/// A pure projection of the post-settlement position: eligible households
/// show their trading activity, ineligible ones appear untouched so the
/// ledger always covers the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Opaque household identifier.
    pub household_id: String,
    /// SHA-256 digest of the id, lowercase hex; safe to publish where the
    /// raw id is not.
    pub id_digest: String,
    /// Original net position (kWh).
    pub net_kwh: f64,
    /// Total energy moved in either direction (kWh).
    pub traded_kwh: f64,
    /// Signed money flow (currency); positive = revenue earned.
    pub net_proceeds: f64,
    /// Untraded energy after settlement (kWh); zero for every eligible
    /// household.
    pub remaining_kwh: f64,
    /// Market role for this snapshot.
    pub role: Role,
    /// Whether the household took part in matching.
    pub eligible: bool,
    /// Overload fault flag from telemetry.
    pub overload: bool,
    /// Transformer fault flag from telemetry.
    pub transformer_fault: bool,
}

/// Computes the privacy-preserving digest of a household id.
///
/// One-way and collision-resistant, so published ledgers can reference
/// households without exposing raw ids.
pub fn household_digest(household_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(household_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Projects final positions into ledger entries, sorted by household id.
///
/// The sort makes repeated runs emit identical row order, so persisting
/// the ledger with an upsert keyed on `household_id` is idempotent.
pub fn build_ledger(positions: &[HouseholdPosition]) -> Vec<LedgerEntry> {
    let mut entries: Vec<LedgerEntry> = positions
        .iter()
        .map(|p| LedgerEntry {
            household_id: p.household_id.clone(),
            id_digest: household_digest(&p.household_id),
            net_kwh: p.net_kwh,
            traded_kwh: p.traded_kwh,
            net_proceeds: p.net_proceeds,
            remaining_kwh: p.remaining_kwh,
            role: p.role,
            eligible: is_eligible(p),
            overload: p.faults.overload,
            transformer_fault: p.faults.transformer_fault,
        })
        .collect();
    entries.sort_by(|a, b| a.household_id.cmp(&b.household_id));
    entries
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:<9} net={:>7.2} kWh  traded={:>6.2} kWh  \
             proceeds={:>+8.3}  remaining={:>6.2} kWh{}",
            self.household_id,
            self.role,
            self.net_kwh,
            self.traded_kwh,
            self.net_proceeds,
            self.remaining_kwh,
            if self.eligible { "" } else { "  [excluded]" },
        )
    }
}
