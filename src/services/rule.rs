//! Envelope rule service
//!
//! Create, update and remove envelope rules, plus the partial updates applied
//! from a chosen fix option.

use crate::audit::EntityType;
use crate::error::{FixitError, FixitResult};
use crate::models::{EnvelopeRule, Money, PriorityGroup, RuleChanges};
use crate::storage::Storage;

/// Field updates for `rule set`; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RuleInput {
    pub monthly_budget: Option<Money>,
    pub due_by_day: Option<u32>,
    /// Remove the due date (and due amount) from the rule
    pub clear_due: bool,
    pub due_amount: Option<Money>,
    pub buffer_months: Option<f64>,
    pub priority_group: Option<PriorityGroup>,
    pub protected: Option<bool>,
    /// Replaces the alias list when given
    pub aliases: Option<Vec<String>>,
}

impl RuleInput {
    fn apply_to(&self, rule: &mut EnvelopeRule) {
        if let Some(budget) = self.monthly_budget {
            rule.monthly_budget = budget;
        }
        if self.clear_due {
            rule.due_by_day = None;
            rule.due_amount = None;
        }
        if let Some(day) = self.due_by_day {
            rule.due_by_day = Some(day);
        }
        if let Some(amount) = self.due_amount {
            rule.due_amount = Some(amount);
        }
        if let Some(buffer) = self.buffer_months {
            rule.buffer_months = buffer;
        }
        if let Some(group) = self.priority_group {
            rule.priority_group = group;
        }
        if let Some(protected) = self.protected {
            rule.protected = protected;
        }
        if let Some(aliases) = &self.aliases {
            rule.aliases = aliases
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
        }
    }
}

/// Service for envelope rule management
pub struct RuleService<'a> {
    storage: &'a Storage,
}

impl<'a> RuleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// List all rules sorted by name
    pub fn list(&self) -> FixitResult<Vec<EnvelopeRule>> {
        self.storage.rules.get_all()
    }

    /// Find a rule by name or alias
    pub fn find(&self, name: &str) -> FixitResult<Option<EnvelopeRule>> {
        self.storage.rules.get_by_name(name)
    }

    pub fn get(&self, name: &str) -> FixitResult<EnvelopeRule> {
        self.find(name)?
            .ok_or_else(|| FixitError::rule_not_found(name))
    }

    /// Create the rule if missing, otherwise update the given fields
    ///
    /// Returns the stored rule and whether it was newly created.
    pub fn set(&self, name: &str, input: &RuleInput) -> FixitResult<(EnvelopeRule, bool)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FixitError::Validation("Envelope name cannot be empty".into()));
        }

        match self.find(name)? {
            Some(existing) => {
                let mut rule = existing.clone();
                input.apply_to(&mut rule);
                rule.updated_at = chrono::Utc::now();
                rule.validate()
                    .map_err(|e| FixitError::Validation(e.to_string()))?;

                self.storage.rules.upsert(rule.clone())?;
                self.storage.rules.save()?;

                self.storage.log_update(
                    EntityType::EnvelopeRule,
                    rule.id.to_string(),
                    Some(rule.name.clone()),
                    &existing,
                    &rule,
                    None,
                )?;

                Ok((rule, false))
            }
            None => {
                let mut rule = EnvelopeRule::new(name, Money::zero(), PriorityGroup::Other);
                input.apply_to(&mut rule);
                rule.validate()
                    .map_err(|e| FixitError::Validation(e.to_string()))?;

                self.storage.rules.upsert(rule.clone())?;
                self.storage.rules.save()?;

                self.storage.log_create(
                    EntityType::EnvelopeRule,
                    rule.id.to_string(),
                    Some(rule.name.clone()),
                    &rule,
                )?;

                Ok((rule, true))
            }
        }
    }

    /// Apply a partial rule change from a fix option
    /// The stored rule and what it would become after `changes`, validated but not saved
    pub fn preview_changes(
        &self,
        name: &str,
        changes: &RuleChanges,
    ) -> FixitResult<(EnvelopeRule, EnvelopeRule)> {
        let existing = self.get(name)?;
        let mut rule = existing.clone();
        rule.apply_changes(changes);
        rule.validate()
            .map_err(|e| FixitError::Validation(format!("{}: {}", existing.name, e)))?;
        Ok((existing, rule))
    }

    pub fn apply_changes(&self, name: &str, changes: &RuleChanges) -> FixitResult<EnvelopeRule> {
        let (existing, rule) = self.preview_changes(name, changes)?;

        self.storage.rules.upsert(rule.clone())?;
        self.storage.rules.save()?;

        self.storage.log_update(
            EntityType::EnvelopeRule,
            rule.id.to_string(),
            Some(rule.name.clone()),
            &existing,
            &rule,
            None,
        )?;

        Ok(rule)
    }

    pub fn remove(&self, name: &str) -> FixitResult<EnvelopeRule> {
        let rule = self.get(name)?;

        self.storage.rules.delete(rule.id)?;
        self.storage.rules.save()?;

        self.storage.log_delete(
            EntityType::EnvelopeRule,
            rule.id.to_string(),
            Some(rule.name.clone()),
            &rule,
        )?;

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::FixitPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FixitPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_set_creates_then_updates() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        let input = RuleInput {
            monthly_budget: Some(Money::from_dollars(1500)),
            due_by_day: Some(1),
            priority_group: Some(PriorityGroup::Necessities),
            ..RuleInput::default()
        };
        let (rule, created) = service.set("Rent", &input).unwrap();
        assert!(created);
        assert_eq!(rule.due_by_day, Some(1));

        let update = RuleInput {
            protected: Some(true),
            ..RuleInput::default()
        };
        let (rule, created) = service.set("rent", &update).unwrap();
        assert!(!created);
        assert!(rule.protected);
        assert_eq!(rule.monthly_budget, Money::from_dollars(1500));
        assert_eq!(service.list().unwrap().len(), 1);

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].changes.as_deref().map(|d| d.contains("protected")), Some(true));
    }

    #[test]
    fn test_set_rejects_invalid_due_day() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        let input = RuleInput {
            due_by_day: Some(40),
            ..RuleInput::default()
        };
        let err = service.set("Rent", &input).unwrap_err();
        assert!(err.is_validation());
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_clear_due() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        let input = RuleInput {
            due_by_day: Some(15),
            due_amount: Some(Money::from_dollars(90)),
            ..RuleInput::default()
        };
        service.set("Phone", &input).unwrap();

        let clear = RuleInput {
            clear_due: true,
            ..RuleInput::default()
        };
        let (rule, _) = service.set("Phone", &clear).unwrap();
        assert_eq!(rule.due_by_day, None);
        assert_eq!(rule.due_amount, None);
    }

    #[test]
    fn test_apply_changes_requires_existing_rule() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        let err = service
            .apply_changes("Nope", &RuleChanges::monthly_budget(Money::from_dollars(10)))
            .unwrap_err();
        assert!(err.is_not_found());

        service.set("Fun", &RuleInput::default()).unwrap();
        let rule = service
            .apply_changes("Fun", &RuleChanges::monthly_budget(Money::from_dollars(250)))
            .unwrap();
        assert_eq!(rule.monthly_budget, Money::from_dollars(250));
    }

    #[test]
    fn test_remove() {
        let (_temp, storage) = create_test_storage();
        let service = RuleService::new(&storage);

        service.set("Fun", &RuleInput::default()).unwrap();
        service.remove("fun").unwrap();
        assert!(service.find("Fun").unwrap().is_none());
        assert!(service.remove("Fun").unwrap_err().is_not_found());
    }
}
