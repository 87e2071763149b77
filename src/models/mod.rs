//! Core data models for envelope-fixit
//!
//! This module contains the data structures the engine consumes and produces:
//! envelope rules, live balances, derived states, issues, fix plans, pending
//! decisions, and the deposit routing types.

pub mod account;
pub mod decision;
pub mod ids;
pub mod issue;
pub mod money;
pub mod plan;
pub mod routing;
pub mod rule;
pub mod state;

pub use account::{AccountBalance, AccountKind};
pub use decision::{DecisionSource, PendingDecision};
pub use ids::{DecisionToken, OverrideId, RuleId};
pub use issue::{DetectedIssue, IssueType, Severity};
pub use money::Money;
pub use plan::{FixPlan, FixPlanOption, OptionId, PlanStep, Vocabulary};
pub use routing::{
    DepositEvent, DepositPlan, DepositPlanLine, RoutingBaseline, RoutingOverride, TOTAL_BPS,
};
pub use rule::{EnvelopeRule, PriorityGroup, RuleChanges, RuleValidationError};
pub use state::{EnvelopeState, EnvelopeStatus};
