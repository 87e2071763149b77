//! Fixit CLI commands
//!
//! Envelope health, issue detection, fix planning and applying a decision.

use clap::Args;

use crate::config::settings::Settings;
use crate::display::{format_apply_outcome, format_decision, format_issue_list, format_state_table};
use crate::engine::ReportedTransfer;
use crate::error::{FixitError, FixitResult};
use crate::models::OptionId;
use crate::services::{ApplyOptions, FixitService, PlanOptions, PlanOutcome};
use crate::storage::Storage;

use super::{parse_money, resolve_today};

/// Permission flags shared by planning and applying
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PermissionArgs {
    /// Allow drawing from Safety Net envelopes
    #[arg(long)]
    pub allow_safety_net: bool,
    /// Allow drawing from protected envelopes
    #[arg(long)]
    pub allow_protected: bool,
}

/// Show every envelope's funding state
pub fn handle_status_command(
    storage: &Storage,
    settings: &Settings,
    today: Option<&str>,
) -> FixitResult<()> {
    let service = FixitService::new(storage, settings);
    let report = service.assess(resolve_today(today)?)?;

    print!("{}", format_state_table(&report.states));
    if !report.issues.is_empty() {
        println!();
        print!("{}", format_issue_list(&report.issues));
    }
    Ok(())
}

/// List detected issues
pub fn handle_issues_command(
    storage: &Storage,
    settings: &Settings,
    today: Option<&str>,
    json: bool,
) -> FixitResult<()> {
    let service = FixitService::new(storage, settings);
    let report = service.assess(resolve_today(today)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.issues)?);
    } else {
        print!("{}", format_issue_list(&report.issues));
    }
    Ok(())
}

/// Generate fix plans for detected issues
pub fn handle_plan_command(
    storage: &Storage,
    settings: &Settings,
    envelopes: Vec<String>,
    permissions: PermissionArgs,
    restore_days: Option<u32>,
    today: Option<&str>,
    json: bool,
) -> FixitResult<()> {
    let service = FixitService::new(storage, settings);
    let options = PlanOptions {
        scope: envelopes,
        allow_safety_net: permissions.allow_safety_net,
        allow_protected: permissions.allow_protected,
        restore_days,
    };

    let outcome = service.plan(resolve_today(today)?, &options)?;
    print_plan_outcome(&outcome, json, "No funding issues detected; nothing to plan.")
}

/// Generate fix plans for a transfer the user already made
#[allow(clippy::too_many_arguments)]
pub fn handle_transfer_command(
    storage: &Storage,
    settings: &Settings,
    amount: &str,
    from: &str,
    to: &str,
    permissions: PermissionArgs,
    restore_days: Option<u32>,
    json: bool,
) -> FixitResult<()> {
    let service = FixitService::new(storage, settings);
    let transfer = ReportedTransfer::new(parse_money(amount, "transfer amount")?, from, to);
    let options = PlanOptions {
        scope: Vec::new(),
        allow_safety_net: permissions.allow_safety_net,
        allow_protected: permissions.allow_protected,
        restore_days,
    };

    let outcome = service.plan_transfer(&transfer, &options)?;
    print_plan_outcome(&outcome, json, "Nothing to plan for this transfer.")
}

fn print_plan_outcome(outcome: &PlanOutcome, json: bool, empty_message: &str) -> FixitResult<()> {
    match &outcome.decision {
        Some(decision) if json => {
            println!("{}", serde_json::to_string_pretty(decision)?);
        }
        Some(decision) => {
            print!("{}", format_decision(decision, outcome.protected_touch.as_ref()));
        }
        None if json => println!("null"),
        None => println!("{}", empty_message),
    }
    Ok(())
}

/// Apply one option of a stored decision
pub fn handle_apply_command(
    storage: &Storage,
    settings: &Settings,
    option: &str,
    token: Option<&str>,
    permissions: PermissionArgs,
) -> FixitResult<()> {
    let option: OptionId = option.parse().map_err(FixitError::Validation)?;
    let service = FixitService::new(storage, settings);

    let outcome = service.apply(
        option,
        token,
        ApplyOptions {
            allow_safety_net: permissions.allow_safety_net,
            allow_protected: permissions.allow_protected,
        },
    )?;
    print!("{}", format_apply_outcome(&outcome));
    Ok(())
}

/// List stored decisions, or show one in full
pub fn handle_decisions_command(
    storage: &Storage,
    settings: &Settings,
    token: Option<&str>,
) -> FixitResult<()> {
    let service = FixitService::new(storage, settings);

    if let Some(token) = token {
        let decision = service.find_decision(Some(token))?;
        print!("{}", format_decision(&decision, None));
        return Ok(());
    }

    let decisions = service.decisions()?;
    if decisions.is_empty() {
        println!("No decisions stored.");
        return Ok(());
    }

    for decision in decisions.iter().rev() {
        let envelopes: Vec<&str> = decision
            .plans
            .iter()
            .map(|p| p.issue.envelope_name.as_str())
            .collect();
        let state = match decision.chosen_option {
            Some(option) => format!("applied {}", option),
            None => "pending".to_string(),
        };
        println!(
            "{}  {}  {:<10}  {}",
            decision.token,
            decision.created_at.format("%Y-%m-%d %H:%M"),
            state,
            envelopes.join(", ")
        );
    }
    Ok(())
}
