//! Envelope rules and priority groups
//!
//! A rule is the persisted funding policy for one envelope: how much it is
//! budgeted per month, when (if ever) it must be funded by, how many months of
//! buffer it keeps, and how willing it is to lend to other envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::RuleId;
use super::money::Money;

/// The fixed set of priority groups an envelope can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PriorityGroup {
    Savings,
    SafetyNet,
    Necessities,
    Pressing,
    Kiddos,
    Discretionary,
    #[default]
    Other,
}

impl PriorityGroup {
    /// Get all priority groups in declaration order
    pub fn all() -> &'static [Self] {
        &[
            Self::Savings,
            Self::SafetyNet,
            Self::Necessities,
            Self::Pressing,
            Self::Kiddos,
            Self::Discretionary,
            Self::Other,
        ]
    }

    /// Get the canonical name for this group
    pub fn name(&self) -> &'static str {
        match self {
            Self::Savings => "Savings",
            Self::SafetyNet => "SafetyNet",
            Self::Necessities => "Necessities",
            Self::Pressing => "Pressing",
            Self::Kiddos => "Kiddos",
            Self::Discretionary => "Discretionary",
            Self::Other => "Other",
        }
    }

    /// Groups that are preferred as the offset when re-routing deposits
    pub fn is_discretionary_like(&self) -> bool {
        matches!(self, Self::Discretionary | Self::Pressing)
    }
}

impl fmt::Display for PriorityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PriorityGroup {
    type Err = RuleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Self::all()
            .iter()
            .copied()
            .find(|g| g.name().to_lowercase() == normalized)
            .ok_or_else(|| RuleValidationError::UnknownPriorityGroup(s.to_string()))
    }
}

/// Persisted funding policy for a single envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRule {
    /// Unique identifier
    pub id: RuleId,

    /// Envelope name; must match the live pod name exactly
    pub name: String,

    /// Alternate names users refer to this envelope by
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(rename = "monthlyBudgetDollars")]
    pub monthly_budget: Money,

    /// Day of month (1-31) the envelope must be funded by
    #[serde(default)]
    pub due_by_day: Option<u32>,

    /// Amount due by `due_by_day`; falls back to the monthly budget
    #[serde(default, rename = "dueAmountDollars")]
    pub due_amount: Option<Money>,

    /// Months of monthly budget kept as a floor
    #[serde(default)]
    pub buffer_months: f64,

    #[serde(default)]
    pub priority_group: PriorityGroup,

    #[serde(default)]
    pub protected: bool,

    pub updated_at: DateTime<Utc>,
}

impl EnvelopeRule {
    /// Create a new rule with no due date and no buffer
    pub fn new(name: impl Into<String>, monthly_budget: Money, priority_group: PriorityGroup) -> Self {
        Self {
            id: RuleId::new(),
            name: name.into(),
            aliases: Vec::new(),
            monthly_budget,
            due_by_day: None,
            due_amount: None,
            buffer_months: 0.0,
            priority_group,
            protected: false,
            updated_at: Utc::now(),
        }
    }

    /// Set the due day and (optionally) an explicit due amount
    pub fn with_due(mut self, due_by_day: u32, due_amount: Option<Money>) -> Self {
        self.due_by_day = Some(due_by_day);
        self.due_amount = due_amount;
        self
    }

    pub fn with_buffer_months(mut self, buffer_months: f64) -> Self {
        self.buffer_months = buffer_months;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// The due day, when one is set and meaningful
    pub fn active_due_day(&self) -> Option<u32> {
        self.due_by_day.filter(|d| *d > 0)
    }

    /// Amount due by the due day, defaulting to the monthly budget
    pub fn effective_due_amount(&self) -> Money {
        self.due_amount.unwrap_or(self.monthly_budget)
    }

    /// Check whether `query` names this envelope (name or alias, case-insensitive)
    pub fn matches_name(&self, query: &str) -> bool {
        let query = query.trim();
        self.name.eq_ignore_ascii_case(query)
            || self.aliases.iter().any(|a| a.trim().eq_ignore_ascii_case(query))
    }

    /// Apply a partial rule change, bumping `updated_at`
    pub fn apply_changes(&mut self, changes: &RuleChanges) {
        if let Some(budget) = changes.monthly_budget {
            self.monthly_budget = budget;
        }
        if let Some(buffer) = changes.buffer_months {
            self.buffer_months = buffer;
        }
        if let Some(due_amount) = changes.due_amount {
            self.due_amount = Some(due_amount);
        }
        if let Some(day) = changes.due_by_day {
            self.due_by_day = Some(day);
        }
        self.updated_at = Utc::now();
    }

    /// Validate the rule
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.name.trim().is_empty() {
            return Err(RuleValidationError::EmptyName);
        }

        if let Some(day) = self.due_by_day {
            if !(1..=31).contains(&day) {
                return Err(RuleValidationError::InvalidDueDay(day));
            }
        }

        if !self.buffer_months.is_finite() || self.buffer_months < 0.0 {
            return Err(RuleValidationError::InvalidBufferMonths(self.buffer_months));
        }

        if self.monthly_budget.is_negative() || self.due_amount.is_some_and(|d| d.is_negative()) {
            return Err(RuleValidationError::NegativeAmount);
        }

        Ok(())
    }
}

impl fmt::Display for EnvelopeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A partial update to an envelope rule, produced by structural plan steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleChanges {
    #[serde(
        default,
        rename = "monthlyBudgetDollars",
        skip_serializing_if = "Option::is_none"
    )]
    pub monthly_budget: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_months: Option<f64>,

    #[serde(
        default,
        rename = "dueAmountDollars",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_amount: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_by_day: Option<u32>,
}

impl RuleChanges {
    pub fn monthly_budget(amount: Money) -> Self {
        Self {
            monthly_budget: Some(amount),
            ..Self::default()
        }
    }

    pub fn due_amount(amount: Money) -> Self {
        Self {
            due_amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_budget.is_none()
            && self.buffer_months.is_none()
            && self.due_amount.is_none()
            && self.due_by_day.is_none()
    }

    /// Names of the fields this change touches, for summaries
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.monthly_budget.is_some() {
            fields.push("monthly_budget");
        }
        if self.buffer_months.is_some() {
            fields.push("buffer_months");
        }
        if self.due_amount.is_some() {
            fields.push("due_amount");
        }
        if self.due_by_day.is_some() {
            fields.push("due_by_day");
        }
        fields
    }
}

/// Validation errors for envelope rules
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValidationError {
    EmptyName,
    InvalidDueDay(u32),
    InvalidBufferMonths(f64),
    NegativeAmount,
    UnknownPriorityGroup(String),
}

impl fmt::Display for RuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Envelope name cannot be empty"),
            Self::InvalidDueDay(day) => write!(f, "Due day must be between 1 and 31 (got {})", day),
            Self::InvalidBufferMonths(m) => write!(f, "Buffer months must be >= 0 (got {})", m),
            Self::NegativeAmount => write!(f, "Budget and due amounts cannot be negative"),
            Self::UnknownPriorityGroup(g) => write!(
                f,
                "Unknown priority group '{}' (expected one of: {})",
                g,
                PriorityGroup::all()
                    .iter()
                    .map(|g| g.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for RuleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_group_parse() {
        assert_eq!("SafetyNet".parse::<PriorityGroup>().unwrap(), PriorityGroup::SafetyNet);
        assert_eq!("safety net".parse::<PriorityGroup>().unwrap(), PriorityGroup::SafetyNet);
        assert_eq!("discretionary".parse::<PriorityGroup>().unwrap(), PriorityGroup::Discretionary);
        assert!("Luxuries".parse::<PriorityGroup>().is_err());
    }

    #[test]
    fn test_effective_due_amount_defaults_to_budget() {
        let rule = EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities)
            .with_due(1, None);
        assert_eq!(rule.effective_due_amount(), Money::from_dollars(1500));

        let rule = rule.with_due(1, Some(Money::from_dollars(1200)));
        assert_eq!(rule.effective_due_amount(), Money::from_dollars(1200));
    }

    #[test]
    fn test_matches_name_and_alias() {
        let mut rule = EnvelopeRule::new("Groceries", Money::from_dollars(600), PriorityGroup::Necessities);
        rule.aliases.push("food".into());

        assert!(rule.matches_name("groceries"));
        assert!(rule.matches_name(" Food "));
        assert!(!rule.matches_name("Gas"));
    }

    #[test]
    fn test_validation() {
        let rule = EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities);
        assert!(rule.validate().is_ok());

        let bad_day = rule.clone().with_due(32, None);
        assert_eq!(bad_day.validate(), Err(RuleValidationError::InvalidDueDay(32)));

        let bad_buffer = rule.clone().with_buffer_months(-1.0);
        assert!(matches!(
            bad_buffer.validate(),
            Err(RuleValidationError::InvalidBufferMonths(_))
        ));

        let mut empty = rule;
        empty.name = "  ".into();
        assert_eq!(empty.validate(), Err(RuleValidationError::EmptyName));
    }

    #[test]
    fn test_apply_changes() {
        let mut rule = EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities);
        let changes = RuleChanges::due_amount(Money::from_dollars(1600));
        rule.apply_changes(&changes);

        assert_eq!(rule.due_amount, Some(Money::from_dollars(1600)));
        assert_eq!(rule.monthly_budget, Money::from_dollars(1500));
        assert_eq!(changes.field_names(), vec!["due_amount"]);
    }

    #[test]
    fn test_rule_changes_serialize_only_set_fields() {
        let changes = RuleChanges::monthly_budget(Money::from_dollars(250));
        let json = serde_json::to_string(&changes).unwrap();
        assert_eq!(json, r#"{"monthlyBudgetDollars":250.0}"#);
    }
}
