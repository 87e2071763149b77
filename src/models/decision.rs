//! Pending fix decisions
//!
//! Generated plans are persisted verbatim under a short token so the user can
//! pick option A, B or C later. A decision can be applied once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::DecisionToken;
use super::plan::{FixPlan, OptionId};

/// What produced the plans in a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Plans for detected issues
    #[default]
    Issues,
    /// Plans for a transfer the user reported
    Transfer,
}

/// A set of plans waiting for the user's choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDecision {
    pub token: DecisionToken,

    #[serde(default)]
    pub source: DecisionSource,

    pub plans: Vec<FixPlan>,

    /// Permissions the plans were generated with; applied overrides inherit them
    #[serde(default)]
    pub allow_safety_net: bool,

    #[serde(default)]
    pub allow_protected_reduction: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub chosen_option: Option<OptionId>,

    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

impl PendingDecision {
    pub fn new(source: DecisionSource, plans: Vec<FixPlan>) -> Self {
        Self {
            token: DecisionToken::new(),
            source,
            plans,
            allow_safety_net: false,
            allow_protected_reduction: false,
            created_at: Utc::now(),
            chosen_option: None,
            applied_at: None,
        }
    }

    pub fn with_permissions(mut self, allow_safety_net: bool, allow_protected_reduction: bool) -> Self {
        self.allow_safety_net = allow_safety_net;
        self.allow_protected_reduction = allow_protected_reduction;
        self
    }

    pub fn is_applied(&self) -> bool {
        self.chosen_option.is_some()
    }

    /// Record the chosen option
    pub fn mark_applied(&mut self, option: OptionId) {
        self.chosen_option = Some(option);
        self.applied_at = Some(Utc::now());
    }

    pub fn matches_token(&self, query: &str) -> bool {
        self.token.matches(query)
    }
}
