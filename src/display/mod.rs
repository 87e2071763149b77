//! Display formatting for terminal output
//!
//! Formats rules, envelope states, plans and routing data as aligned text.

pub mod plan;
pub mod routing;
pub mod rule;
pub mod status;

pub use plan::{format_apply_outcome, format_decision, format_fix_plan, format_step};
pub use routing::{
    format_audit_entries, format_baseline_list, format_deposit_plan, format_import_summary,
    format_override_list,
};
pub use rule::{format_rule_details, format_rule_list};
pub use status::{format_balance_list, format_issue_list, format_state_table};
