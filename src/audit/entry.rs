//! One line of the audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::diff::generate_diff;

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
    Removed,
}

/// Kinds of stored state that leave an audit trail
///
/// Balances and snapshots are observations rather than decisions, so they
/// have no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    EnvelopeRule,
    RoutingBaseline,
    RoutingOverride,
    DepositEvent,
    Decision,
}

impl EntityType {
    /// Word used for the entity in `audit` output
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnvelopeRule => "rule",
            Self::RoutingBaseline => "baseline",
            Self::RoutingOverride => "override",
            Self::DepositEvent => "deposit",
            Self::Decision => "decision",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Removed => "removed",
        })
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub entity_type: EntityType,

    /// Short id, deposit idempotency key, or envelope name for baselines
    pub entity_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// `field: old -> new` pairs, or a caller-supplied description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: Action,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            before: None,
            after: None,
            changes: None,
        }
    }

    /// Attach the entity as it was and as it is now
    ///
    /// When both sides are present the field changes are summarized.
    pub fn with_states<T: Serialize>(mut self, before: Option<&T>, after: Option<&T>) -> Self {
        self.before = before.and_then(|b| serde_json::to_value(b).ok());
        self.after = after.and_then(|a| serde_json::to_value(a).ok());
        if let (Some(b), Some(a)) = (&self.before, &self.after) {
            self.changes = generate_diff(b, a);
        }
        self
    }

    /// Replace the computed change summary
    pub fn with_changes(mut self, changes: Option<String>) -> Self {
        if changes.is_some() {
            self.changes = changes;
        }
        self
    }

    /// `rule Rent (rul-1a2b3c4d)`, or just the type and id when unnamed
    pub fn subject(&self) -> String {
        match &self.entity_name {
            Some(name) if *name != self.entity_id => {
                format!("{} {} ({})", self.entity_type, name, self.entity_id)
            }
            _ => format!("{} {}", self.entity_type, self.entity_id),
        }
    }

    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.subject()
        );
        if let Some(changes) = &self.changes {
            output.push_str("\n  Changes: ");
            output.push_str(changes);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serializes_snake_case_kinds() {
        let entry = AuditEntry::new(Action::Removed, EntityType::RoutingOverride, "ovr-1a2b3c4d", None);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action"], "removed");
        assert_eq!(value["entity_type"], "routing_override");
        assert!(value.get("changes").is_none());
    }

    #[test]
    fn test_rule_update_summarizes_fields() {
        let before = json!({"name": "Rent", "monthlyBudgetDollars": 1500.0});
        let after = json!({"name": "Rent", "monthlyBudgetDollars": 1600.0});

        let entry = AuditEntry::new(
            Action::Updated,
            EntityType::EnvelopeRule,
            "rul-12345678",
            Some("Rent".to_string()),
        )
        .with_states(Some(&before), Some(&after));

        assert_eq!(
            entry.changes.as_deref(),
            Some("monthlyBudgetDollars: 1500.0 -> 1600.0")
        );
    }

    #[test]
    fn test_decision_summary_overrides_diff() {
        let before = json!({"chosenOption": null});
        let after = json!({"chosenOption": "B"});

        let entry = AuditEntry::new(Action::Updated, EntityType::Decision, "dec-12345678", None)
            .with_states(Some(&before), Some(&after))
            .with_changes(Some("chosenOption: (none) -> B".into()));
        assert_eq!(entry.changes.as_deref(), Some("chosenOption: (none) -> B"));

        let kept = entry.clone().with_changes(None);
        assert_eq!(kept.changes, entry.changes);
    }

    #[test]
    fn test_deposit_entry_has_only_after_state() {
        let event = json!({"idempotencyKey": "dep-1", "depositAmount": 2500.0});
        let entry = AuditEntry::new(Action::Created, EntityType::DepositEvent, "dep-1", None)
            .with_states(None, Some(&event));

        assert!(entry.before.is_none());
        assert_eq!(entry.after, Some(event));
        assert!(entry.changes.is_none());
    }

    #[test]
    fn test_human_readable_subject() {
        let named = AuditEntry::new(
            Action::Created,
            EntityType::Decision,
            "dec-12345678",
            Some("Rent".to_string()),
        );
        assert!(named
            .format_human_readable()
            .ends_with("] created decision Rent (dec-12345678)"));

        let baseline = AuditEntry::new(
            Action::Updated,
            EntityType::RoutingBaseline,
            "Rent",
            Some("Rent".to_string()),
        )
        .with_changes(Some("bps: 6000 -> 5500".into()));
        let formatted = baseline.format_human_readable();
        assert!(formatted.contains("updated baseline Rent\n  Changes: bps: 6000 -> 5500"));
    }
}
