//! Envelope status display
//!
//! Formats balances, envelope states and detected issues.

use crate::models::{AccountBalance, DetectedIssue, EnvelopeState};

fn money_or_dash(value: Option<crate::models::Money>) -> String {
    value.map_or_else(|| "-".to_string(), |m| m.to_string())
}

/// Format stored balances
pub fn format_balance_list(accounts: &[AccountBalance]) -> String {
    if accounts.is_empty() {
        return "No balances recorded.\n\nUse 'fixit balance set <name> <amount>' to add one."
            .to_string();
    }

    let name_width = accounts
        .iter()
        .map(|a| a.name.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:<13}  {:>12}\n",
        "Account",
        "Type",
        "Balance",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:-<13}  {:->12}\n",
        "",
        "",
        "",
        width = name_width
    ));

    for account in accounts {
        output.push_str(&format!(
            "{:<width$}  {:<13}  {:>12}\n",
            account.name,
            account.kind.to_string(),
            money_or_dash(account.balance),
            width = name_width
        ));
    }

    output
}

/// Format envelope states as a health table
pub fn format_state_table(states: &[EnvelopeState]) -> String {
    if states.is_empty() {
        return "No envelopes to show.".to_string();
    }

    let name_width = states
        .iter()
        .map(|s| s.name.chars().count() + usize::from(s.protected))
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:>12}  {:>12}  {:>12}  {:>12}  {:<15}  {}\n",
        "Envelope",
        "Balance",
        "Floor",
        "By Due",
        "Available",
        "Status",
        "Reason",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->12}  {:->12}  {:->12}  {:->12}  {:-<15}  {:-<6}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        width = name_width
    ));

    for state in states {
        let name = if state.protected {
            format!("{}*", state.name)
        } else {
            state.name.clone()
        };
        output.push_str(&format!(
            "{:<width$}  {:>12}  {:>12}  {:>12}  {:>12}  {:<15}  {}\n",
            name,
            money_or_dash(state.balance),
            state.required_floor.to_string(),
            money_or_dash(state.required_by_due),
            money_or_dash(state.available_to_spend),
            state.status.to_string(),
            state.status_reason.as_deref().unwrap_or(""),
            width = name_width
        ));
    }

    if states.iter().any(|s| s.protected) {
        output.push_str("\n* protected\n");
    }

    output
}

/// Format detected issues, most severe first
pub fn format_issue_list(issues: &[DetectedIssue]) -> String {
    if issues.is_empty() {
        return "No funding issues detected.".to_string();
    }

    let mut sorted: Vec<&DetectedIssue> = issues.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut output = format!("{} issue(s):\n", issues.len());
    for issue in sorted {
        output.push_str(&format!(
            "  [{}] {} {}: short {}. {}\n",
            issue.severity, issue.issue_type, issue.envelope_name, issue.shortfall, issue.reason
        ));
    }

    output
}
