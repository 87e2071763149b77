//! The budget envelope engine
//!
//! Pure, synchronous computation. Balances and rules flow through
//! [`state`] and [`issues`] into [`plans`]; deposits are routed
//! independently by [`deposit`].

pub mod deposit;
pub mod donor;
pub mod issues;
pub mod plans;
pub mod state;
pub mod transfer;

pub use deposit::{compute_deposit_plan, Allocation, DepositInput, Slot};
pub use donor::{
    can_borrow_from_donor, donors_by_priority, group_rank, DonorPermissions, DonorRejection,
    DONOR_PRIORITY_ORDER,
};
pub use issues::{
    detect_issues, due_dates_needing_snapshots, next_due_date, IssueReport, SnapshotBalances,
};
pub use plans::{generate_plans, PlanRequest};
pub use state::{compute_envelope_state, compute_envelope_states};
pub use transfer::{generate_transfer_plans, ReportedTransfer};
