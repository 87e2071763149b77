//! Rule display formatting
//!
//! Formats envelope rules for terminal output in table and detail views.

use crate::models::EnvelopeRule;

/// Format rules as an aligned table
pub fn format_rule_list(rules: &[EnvelopeRule]) -> String {
    if rules.is_empty() {
        return "No envelope rules found.\n\nRun 'fixit import <expenses.csv>' or 'fixit rule set <name>' to add some."
            .to_string();
    }

    let name_width = rules
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$}  {:>12}  {:>4}  {:>12}  {:>6}  {:<13}  {}\n",
        "Envelope",
        "Monthly",
        "Due",
        "Due Amount",
        "Buffer",
        "Group",
        "Protected",
        width = name_width
    ));
    output.push_str(&format!(
        "{:-<width$}  {:->12}  {:->4}  {:->12}  {:->6}  {:-<13}  {:-<9}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        width = name_width
    ));

    for rule in rules {
        let due = rule
            .active_due_day()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let due_amount = if rule.active_due_day().is_some() {
            rule.effective_due_amount().to_string()
        } else {
            "-".to_string()
        };

        output.push_str(&format!(
            "{:<width$}  {:>12}  {:>4}  {:>12}  {:>6}  {:<13}  {}\n",
            rule.name,
            rule.monthly_budget.to_string(),
            due,
            due_amount,
            format!("{:.1}", rule.buffer_months),
            rule.priority_group.to_string(),
            if rule.protected { "yes" } else { "" },
            width = name_width
        ));
    }

    output
}

/// Format one rule in detail
pub fn format_rule_details(rule: &EnvelopeRule) -> String {
    let mut output = String::new();

    output.push_str(&format!("Envelope: {}\n", rule.name));
    output.push_str(&format!("  ID:             {}\n", rule.id));
    if !rule.aliases.is_empty() {
        output.push_str(&format!("  Aliases:        {}\n", rule.aliases.join(", ")));
    }
    output.push_str(&format!("  Monthly budget: {}\n", rule.monthly_budget));
    match rule.active_due_day() {
        Some(day) => {
            output.push_str(&format!("  Due by day:     {}\n", day));
            output.push_str(&format!("  Due amount:     {}\n", rule.effective_due_amount()));
        }
        None => output.push_str("  Due by day:     -\n"),
    }
    output.push_str(&format!("  Buffer months:  {}\n", rule.buffer_months));
    output.push_str(&format!("  Group:          {}\n", rule.priority_group));
    output.push_str(&format!(
        "  Protected:      {}\n",
        if rule.protected { "Yes" } else { "No" }
    ));
    output.push_str(&format!(
        "  Updated:        {}\n",
        rule.updated_at.format("%Y-%m-%d %H:%M")
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, PriorityGroup};

    #[test]
    fn test_format_rule_list() {
        let rules = vec![
            EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities)
                .with_due(1, None)
                .protected(),
            EnvelopeRule::new("Fun", Money::from_dollars(100), PriorityGroup::Discretionary),
        ];

        let output = format_rule_list(&rules);
        assert!(output.contains("Rent"));
        assert!(output.contains("$1500.00"));
        assert!(output.contains("Discretionary"));
        assert!(output.contains("yes"));
    }

    #[test]
    fn test_format_empty_list() {
        assert!(format_rule_list(&[]).contains("No envelope rules found"));
    }

    #[test]
    fn test_format_rule_details() {
        let mut rule = EnvelopeRule::new("Groceries", Money::from_dollars(600), PriorityGroup::Necessities);
        rule.aliases.push("food".into());

        let output = format_rule_details(&rule);
        assert!(output.contains("Envelope: Groceries"));
        assert!(output.contains("Aliases:        food"));
        assert!(output.contains("Due by day:     -"));
    }
}
