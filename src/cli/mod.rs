//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod balance;
pub mod fixit;
pub mod import;
pub mod routing;
pub mod rule;

pub use audit::handle_audit_command;
pub use balance::{handle_balance_command, BalanceCommands};
pub use fixit::{
    handle_apply_command, handle_decisions_command, handle_issues_command, handle_plan_command,
    handle_status_command, handle_transfer_command, PermissionArgs,
};
pub use import::handle_import_command;
pub use routing::{
    handle_baseline_command, handle_deposit_command, handle_override_command, BaselineCommands,
    DepositCommands, OverrideCommands,
};
pub use rule::{handle_rule_command, RuleCommands};

use chrono::{Local, NaiveDate};

use crate::error::{FixitError, FixitResult};
use crate::models::Money;

/// Parse a dollar amount argument such as "1500", "$1,500.00" or "(25)"
pub(crate) fn parse_money(value: &str, what: &str) -> FixitResult<Money> {
    Money::parse(value).map_err(|e| {
        FixitError::Validation(format!(
            "Invalid {}: '{}'. Use a format like '1500.00'. Error: {}",
            what, value, e
        ))
    })
}

/// Resolve `--today`, defaulting to the local date
pub(crate) fn resolve_today(today: Option<&str>) -> FixitResult<NaiveDate> {
    match today {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

pub(crate) fn parse_date(value: &str) -> FixitResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        FixitError::Validation(format!("Invalid date: '{}'. Use YYYY-MM-DD.", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money_argument() {
        assert_eq!(parse_money("$1,500", "amount").unwrap(), Money::from_dollars(1500));
        let err = parse_money("lots", "amount").unwrap_err();
        assert!(err.to_string().contains("Invalid amount: 'lots'"));
    }

    #[test]
    fn test_resolve_today() {
        assert_eq!(
            resolve_today(Some("2025-03-15")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert!(resolve_today(Some("15/03/2025")).is_err());
        assert!(resolve_today(None).is_ok());
    }
}
