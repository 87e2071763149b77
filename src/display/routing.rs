//! Routing display
//!
//! Formats baselines, overrides, deposit plans and import summaries.

use crate::audit::AuditEntry;
use crate::models::{DepositPlan, RoutingBaseline, RoutingOverride, TOTAL_BPS};
use crate::services::ImportSummary;

fn percent(bps: i64) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    format!("{}{}.{:02}%", sign, (bps / 100).abs(), (bps % 100).abs())
}

/// Format baselines with their share and total
pub fn format_baseline_list(baselines: &[RoutingBaseline]) -> String {
    if baselines.is_empty() {
        return "No routing baselines set.".to_string();
    }

    let name_width = baselines
        .iter()
        .map(|b| b.envelope_name.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:>6}  {:>8}\n",
        "Envelope",
        "Bps",
        "Share",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->6}  {:->8}\n",
        "",
        "",
        "",
        width = name_width
    ));

    for baseline in baselines {
        output.push_str(&format!(
            "{:<width$}  {:>6}  {:>8}\n",
            baseline.envelope_name,
            baseline.bps,
            percent(baseline.bps),
            width = name_width
        ));
    }

    let total: i64 = baselines.iter().map(|b| b.bps).sum();
    output.push_str(&format!(
        "{:<width$}  {:>6}  {:>8}\n",
        "TOTAL",
        total,
        percent(total),
        width = name_width
    ));
    if total != TOTAL_BPS {
        output.push_str(&format!(
            "\nBaselines sum to {} bps; the catch-all absorbs the difference.\n",
            total
        ));
    }

    output
}

/// Format overrides, oldest first
pub fn format_override_list(overrides: &[RoutingOverride]) -> String {
    if overrides.is_empty() {
        return "No routing overrides.".to_string();
    }

    let mut output = String::new();
    for o in overrides {
        let remaining = o
            .remaining_deposits
            .map_or_else(|| "open-ended".to_string(), |r| format!("{} deposit(s) left", r));
        output.push_str(&format!(
            "{}  {} {:+} bps, {}",
            o.id, o.envelope_name, o.delta_bps, remaining
        ));
        if let Some(expires) = o.expires_on {
            output.push_str(&format!(", expires {}", expires));
        }
        if o.allow_protected_reduction {
            output.push_str(", may reduce protected");
        }
        output.push('\n');
        if let Some(reason) = &o.reason {
            output.push_str(&format!("    {}\n", reason));
        }
    }

    output
}

/// Format a deposit split
pub fn format_deposit_plan(plan: &DepositPlan) -> String {
    let name_width = plan
        .lines
        .iter()
        .map(|l| l.envelope_name.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = format!("Deposit of {}\n\n", plan.deposit_amount);
    output.push_str(&format!(
        "{:<width$}  {:>6}  {:>12}\n",
        "Envelope",
        "Bps",
        "Amount",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->6}  {:->12}\n",
        "",
        "",
        "",
        width = name_width
    ));

    for line in &plan.lines {
        if line.amount.is_zero() && line.envelope_name != plan.catch_all_envelope_name {
            continue;
        }
        output.push_str(&format!(
            "{:<width$}  {:>6}  {:>12}\n",
            line.envelope_name,
            line.bps,
            line.amount.to_string(),
            width = name_width
        ));
    }

    for warning in &plan.warnings {
        output.push_str(&format!("! {}\n", warning));
    }

    output
}

/// Format what a budget import changed
pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut output = String::new();

    output.push_str("Parsed totals:\n");
    output.push_str(&format!("- total budgeted expenses: {}\n", summary.total_budget));
    if let Some(income) = summary.total_income {
        output.push_str(&format!("- total income: {}\n", income));
    }
    output.push_str(&format!("- envelopes imported: {}\n", summary.envelope_count));
    if summary.skipped_rows > 0 {
        output.push_str(&format!("- rows skipped: {}\n", summary.skipped_rows));
    }
    output.push_str(&format!(
        "- imported envelopes total: {} -> {}\n",
        summary.previous_total, summary.total_budget
    ));

    output.push_str("Envelope budget diffs:\n");
    if summary.budget_diffs.is_empty() {
        output.push_str("- (no changes)\n");
    }
    for diff in &summary.budget_diffs {
        output.push_str(&format!("- {}\n", diff));
    }

    output.push_str("Routing bps summary:\n");
    output.push_str(&format!("- sum bps: {}\n", summary.bps_sum));
    output.push_str(&format!(
        "- catch-all remainder applied: {} to {}\n",
        summary.remainder, summary.catch_all
    ));
    let top: Vec<String> = summary
        .allocations
        .iter()
        .take(10)
        .map(|(name, bps)| format!("{}: {}", name, bps))
        .collect();
    output.push_str(&format!("- top allocations: {}\n", top.join(", ")));
    if summary.first_baselines {
        output.push_str("Note: no routing baselines existed before this import.\n");
    }

    output
}

/// Format audit entries, one block per entry
pub fn format_audit_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "Audit log is empty.".to_string();
    }

    entries
        .iter()
        .map(|e| e.format_human_readable())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DepositPlanLine, Money};

    #[test]
    fn test_percent() {
        assert_eq!(percent(6000), "60.00%");
        assert_eq!(percent(1), "0.01%");
    }

    #[test]
    fn test_baseline_total_mismatch_note() {
        let baselines = vec![RoutingBaseline::new("Rent", 6000), RoutingBaseline::new("Fun", 3000)];
        let output = format_baseline_list(&baselines);
        assert!(output.contains("TOTAL"));
        assert!(output.contains("9000"));
        assert!(output.contains("catch-all absorbs"));
    }

    #[test]
    fn test_format_deposit_plan_skips_zero_lines() {
        let plan = DepositPlan {
            deposit_amount: Money::from_dollars(2500),
            lines: vec![
                DepositPlanLine {
                    envelope_name: "Idle".into(),
                    bps: 0,
                    amount: Money::zero(),
                },
                DepositPlanLine {
                    envelope_name: "Rent".into(),
                    bps: 10_000,
                    amount: Money::from_dollars(2500),
                },
                DepositPlanLine {
                    envelope_name: "Move to ___".into(),
                    bps: 0,
                    amount: Money::zero(),
                },
            ],
            catch_all_envelope_name: "Move to ___".into(),
            warnings: vec!["Clamped adjustment for Rent to stay within max per-deposit change.".into()],
        };

        let output = format_deposit_plan(&plan);
        assert!(!output.contains("Idle"));
        assert!(output.contains("Move to ___"));
        assert!(output.contains("! Clamped adjustment for Rent"));
    }

    #[test]
    fn test_override_list() {
        let o = RoutingOverride::new("Rent", 300).with_remaining_deposits(2);
        let output = format_override_list(&[o]);
        assert!(output.contains("Rent +300 bps, 2 deposit(s) left"));
    }
}
