//! Fix plan display
//!
//! Formats generated plans, stored decisions and the result of applying one.

use crate::models::{FixPlan, FixPlanOption, PendingDecision, PlanStep};
use crate::services::{ApplyOutcome, ProtectedTouch};

/// One human-readable line for a plan step
pub fn format_step(step: &PlanStep) -> String {
    match step {
        PlanStep::Transfer {
            from_envelope,
            to_envelope,
            amount,
        } => format!("Transfer {} from {} to {}", amount, from_envelope, to_envelope),
        PlanStep::RoutingOverride {
            envelope,
            delta_bps,
            remaining_deposits,
        } => format!(
            "Route {:+} bps to {} for {} deposit(s)",
            delta_bps, envelope, remaining_deposits
        ),
        PlanStep::RuleChange { envelope, changes } => {
            let mut parts = Vec::new();
            if let Some(budget) = changes.monthly_budget {
                parts.push(format!("monthly_budget = {}", budget));
            }
            if let Some(buffer) = changes.buffer_months {
                parts.push(format!("buffer_months = {}", buffer));
            }
            if let Some(amount) = changes.due_amount {
                parts.push(format!("due_amount = {}", amount));
            }
            if let Some(day) = changes.due_by_day {
                parts.push(format!("due_by_day = {}", day));
            }
            format!("Change rule {}: {}", envelope, parts.join(", "))
        }
    }
}

fn format_option(option: &FixPlanOption, recommended: bool, output: &mut String) {
    output.push_str(&format!(
        "  {}) [{}] {}{}\n",
        option.option_id,
        option.vocabulary,
        option.label,
        if recommended { "  (recommended)" } else { "" }
    ));
    output.push_str(&format!("     {}\n", option.summary));
    for step in &option.steps {
        output.push_str(&format!("     - {}\n", format_step(step)));
    }
    for warning in &option.warnings {
        output.push_str(&format!("     ! {}\n", warning));
    }
}

/// Format a plan with its three options
pub fn format_fix_plan(plan: &FixPlan) -> String {
    let mut output = format!(
        "{} ({}, {}): short {}\n  {}\n",
        plan.issue.envelope_name,
        plan.issue.issue_type,
        plan.issue.severity,
        plan.issue.shortfall,
        plan.issue.reason
    );
    for option in &plan.options {
        format_option(option, option.option_id == plan.recommended_option_id, &mut output);
    }
    output
}

/// Format a stored decision with its plans and how to apply it
pub fn format_decision(decision: &PendingDecision, protected_touch: Option<&ProtectedTouch>) -> String {
    let mut output = format!("Decision {}\n\n", decision.token);

    for plan in &decision.plans {
        output.push_str(&format_fix_plan(plan));
        output.push('\n');
    }

    if let Some(touch) = protected_touch {
        output.push_str(&format!(
            "Note: the recommended option draws from protected envelope {}. Re-run with {} to allow it.\n",
            touch.envelope_name,
            touch.flag()
        ));
    }

    match decision.chosen_option {
        Some(option) => output.push_str(&format!("Applied option {}.\n", option)),
        None => output.push_str(&format!(
            "Apply with: fixit apply <A|B|C> --token {}\n",
            decision.token
        )),
    }

    output
}

/// Format the confirmation after applying a decision
pub fn format_apply_outcome(outcome: &ApplyOutcome) -> String {
    let mut output = format!(
        "Applied option {} of decision {}\n",
        outcome.option, outcome.decision.token
    );
    for line in &outcome.lines {
        output.push_str(line);
        output.push('\n');
    }
    if outcome
        .lines
        .iter()
        .any(|l| l.starts_with("- Manual transfer:"))
    {
        output.push_str("\nManual transfers are not executed; move the money in your bank.\n");
    }
    output
}
