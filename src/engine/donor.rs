//! Donor policy
//!
//! Decides which envelopes may lend surplus to others and in what order they
//! are asked.

use std::fmt;

use crate::models::{EnvelopeState, PriorityGroup};

/// Borrow order, most willing lender first
pub const DONOR_PRIORITY_ORDER: [PriorityGroup; 7] = [
    PriorityGroup::Discretionary,
    PriorityGroup::Pressing,
    PriorityGroup::Necessities,
    PriorityGroup::Kiddos,
    PriorityGroup::Savings,
    PriorityGroup::SafetyNet,
    PriorityGroup::Other,
];

/// Position of `group` in the borrow order (lower lends first)
pub fn group_rank(group: PriorityGroup) -> usize {
    DONOR_PRIORITY_ORDER
        .iter()
        .position(|g| *g == group)
        .unwrap_or(DONOR_PRIORITY_ORDER.len())
}

/// Explicit permissions granted by the user for a single planning request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DonorPermissions {
    /// Allow borrowing from SafetyNet-group envelopes
    pub allow_safety_net: bool,
    /// Allow reducing protected envelopes
    pub allow_protected_reduction: bool,
}

/// Why a candidate donor was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorRejection {
    MissingBalance,
    HasDueRequirement,
    NoSurplus,
    SafetyNetLocked,
    ProtectedLocked,
}

impl fmt::Display for DonorRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBalance => write!(f, "Missing balance."),
            Self::HasDueRequirement => write!(f, "Donor has a due-date requirement."),
            Self::NoSurplus => write!(f, "No surplus above buffer floor."),
            Self::SafetyNetLocked => write!(f, "Safety Net is locked unless explicitly allowed."),
            Self::ProtectedLocked => {
                write!(f, "Protected envelope is locked unless explicitly allowed.")
            }
        }
    }
}

/// Check whether `donor` may lend under `permissions`
pub fn can_borrow_from_donor(
    donor: &EnvelopeState,
    permissions: DonorPermissions,
) -> Result<(), DonorRejection> {
    let available = match (donor.balance, donor.available_to_spend) {
        (Some(_), Some(available)) => available,
        _ => return Err(DonorRejection::MissingBalance),
    };

    if donor.status.is_due_pressure() {
        return Err(DonorRejection::HasDueRequirement);
    }

    if !available.is_positive() {
        return Err(DonorRejection::NoSurplus);
    }

    let is_safety_net = donor.priority_group == PriorityGroup::SafetyNet;
    if is_safety_net && !permissions.allow_safety_net {
        return Err(DonorRejection::SafetyNetLocked);
    }

    // Safety Net envelopes are usually protected too; allowing the group
    // allows reducing them.
    if donor.protected
        && !permissions.allow_protected_reduction
        && !(is_safety_net && permissions.allow_safety_net)
    {
        return Err(DonorRejection::ProtectedLocked);
    }

    Ok(())
}

/// States ordered by borrow priority; ties keep their input order
pub fn donors_by_priority(states: &[EnvelopeState]) -> Vec<&EnvelopeState> {
    let mut sorted: Vec<&EnvelopeState> = states.iter().collect();
    sorted.sort_by_key(|s| group_rank(s.priority_group));
    sorted
}
