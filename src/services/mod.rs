//! Service layer for envelope-fixit
//!
//! The service layer runs the engine against stored data, handling
//! validation, persistence and audit logging for each operation.

pub mod balance;
pub mod fixit;
pub mod import;
pub mod routing;
pub mod rule;

pub use balance::BalanceService;
pub use fixit::{ApplyOptions, ApplyOutcome, FixitService, PlanOptions, PlanOutcome, ProtectedTouch};
pub use import::{BudgetDiff, EnvelopeOverride, ImportService, ImportSummary, ParsedBudget};
pub use routing::{DepositConfirmation, OverrideInput, RoutingService};
pub use rule::{RuleInput, RuleService};
