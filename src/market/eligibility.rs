//! Trading eligibility rules.

use super::types::{HouseholdPosition, Role};

/// Returns true when a household may participate in matching.
///
/// A household trades only when it carries no fault flags and is not
/// balanced. Ineligible households are never ranked or matched; their
/// positions stay untouched and still appear in the ledger with zero
/// traded energy.
pub fn is_eligible(position: &HouseholdPosition) -> bool {
    !position.faults.any() && position.role != Role::Balanced
}
