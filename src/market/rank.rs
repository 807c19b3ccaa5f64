//! Deterministic ranking of market participants.
//!
//! Rankings are index lists into the snapshot, computed once before
//! matching from the initial net positions. Ordering is total: magnitude
//! first via `f64::total_cmp`, then household id ascending, so equal
//! positions always rank the same way and runs are reproducible.

use super::eligibility::is_eligible;
use super::types::{HouseholdPosition, Role};

/// Returns indices of eligible producers, largest surplus first.
pub fn rank_sellers(positions: &[HouseholdPosition]) -> Vec<usize> {
    let mut sellers: Vec<usize> = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| is_eligible(p) && p.role == Role::Producer)
        .map(|(i, _)| i)
        .collect();
    sellers.sort_by(|&a, &b| {
        positions[b]
            .net_kwh
            .total_cmp(&positions[a].net_kwh)
            .then_with(|| positions[a].household_id.cmp(&positions[b].household_id))
    });
    sellers
}

/// Returns indices of eligible consumers, largest deficit first.
pub fn rank_buyers(positions: &[HouseholdPosition]) -> Vec<usize> {
    let mut buyers: Vec<usize> = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| is_eligible(p) && p.role == Role::Consumer)
        .map(|(i, _)| i)
        .collect();
    buyers.sort_by(|&a, &b| {
        positions[b]
            .net_kwh
            .abs()
            .total_cmp(&positions[a].net_kwh.abs())
            .then_with(|| positions[a].household_id.cmp(&positions[b].household_id))
    });
    buyers
}
