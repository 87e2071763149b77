//! Derived envelope state
//!
//! An `EnvelopeState` is recomputed on every invocation from a rule and its
//! live balance; it is never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::rule::PriorityGroup;

/// Funding health of an envelope
///
/// Statuses are mutually exclusive. When several would apply the most severe
/// wins: overdue > due_soon > buffer_breached > OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnvelopeStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "buffer_breached")]
    BufferBreached,
    #[serde(rename = "due_soon")]
    DueSoon,
    #[serde(rename = "overdue")]
    Overdue,
}

impl EnvelopeStatus {
    /// Whether the envelope has a due-date requirement it is failing
    pub fn is_due_pressure(&self) -> bool {
        matches!(self, Self::DueSoon | Self::Overdue)
    }
}

impl fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::BufferBreached => write!(f, "buffer_breached"),
            Self::DueSoon => write!(f, "due_soon"),
            Self::Overdue => write!(f, "overdue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeState {
    pub name: String,

    #[serde(rename = "balanceDollars")]
    pub balance: Option<Money>,

    #[serde(rename = "monthlyBudgetDollars")]
    pub monthly_budget: Money,

    pub due_by_day: Option<u32>,

    #[serde(rename = "dueAmountDollars")]
    pub due_amount: Money,

    pub buffer_months: f64,

    /// round2(monthly_budget × buffer_months)
    #[serde(rename = "requiredFloorDollars")]
    pub required_floor: Money,

    /// round2(required_floor + due_amount); only when a due day is set
    #[serde(rename = "requiredByDueDollars", skip_serializing_if = "Option::is_none", default)]
    pub required_by_due: Option<Money>,

    /// balance − required_floor; `None` when the balance is unknown
    #[serde(rename = "availableToSpendDollars")]
    pub available_to_spend: Option<Money>,

    pub status: EnvelopeStatus,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_reason: Option<String>,

    pub priority_group: PriorityGroup,

    pub protected: bool,
}

impl EnvelopeState {
    /// Shortfall against the due-date requirement using the current balance
    pub fn due_shortfall(&self) -> Option<Money> {
        match (self.balance, self.required_by_due) {
            (Some(balance), Some(required)) => Some((required - balance).non_negative()),
            _ => None,
        }
    }
}
