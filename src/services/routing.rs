//! Routing service
//!
//! Manages baseline splits and overrides, computes the split of an incoming
//! deposit, and counts confirmed deposits against override countdowns.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::engine::{compute_deposit_plan, DepositInput};
use crate::error::{FixitError, FixitResult};
use crate::models::{DepositEvent, DepositPlan, Money, RoutingBaseline, RoutingOverride, TOTAL_BPS};
use crate::storage::Storage;

/// Input for a manually added override
#[derive(Debug, Clone, Default)]
pub struct OverrideInput {
    pub envelope_name: String,
    pub delta_bps: i64,
    pub remaining_deposits: Option<u32>,
    pub expires_on: Option<NaiveDate>,
    pub reason: Option<String>,
    pub created_by: Option<String>,
    pub allow_protected_reduction: bool,
}

impl OverrideInput {
    /// Reject inputs `add_override` would refuse to store
    pub fn validate(&self) -> FixitResult<()> {
        if self.envelope_name.trim().is_empty() {
            return Err(FixitError::Validation("Envelope name cannot be empty".into()));
        }
        if self.delta_bps == 0 || self.delta_bps.abs() > TOTAL_BPS {
            return Err(FixitError::Validation(format!(
                "Override delta must be non-zero and within ±{} bps, got {}",
                TOTAL_BPS, self.delta_bps
            )));
        }
        if self.remaining_deposits == Some(0) {
            return Err(FixitError::Validation(
                "Remaining deposits must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of confirming a deposit
#[derive(Debug, Clone)]
pub struct DepositConfirmation {
    pub plan: DepositPlan,
    /// False when the idempotency key was already recorded
    pub newly_recorded: bool,
    /// Overrides whose countdown was decremented
    pub consumed: Vec<RoutingOverride>,
}

/// Service for routing baselines, overrides and deposit plans
pub struct RoutingService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> RoutingService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn baselines(&self) -> FixitResult<Vec<RoutingBaseline>> {
        self.storage.routing.baselines()
    }

    /// Set an envelope's baseline share
    pub fn set_baseline(&self, envelope_name: &str, bps: i64) -> FixitResult<RoutingBaseline> {
        let envelope_name = envelope_name.trim();
        if envelope_name.is_empty() {
            return Err(FixitError::Validation("Envelope name cannot be empty".into()));
        }

        let previous = self.storage.routing.upsert_baseline(envelope_name, bps)?;
        self.storage.routing.save()?;

        let baseline = RoutingBaseline::new(envelope_name, bps);
        match previous {
            Some(before) => self.storage.log_update(
                EntityType::RoutingBaseline,
                envelope_name,
                None,
                &before,
                &baseline,
                Some(format!("bps: {} -> {}", before.bps, bps)),
            )?,
            None => self.storage.log_create(
                EntityType::RoutingBaseline,
                envelope_name,
                None,
                &baseline,
            )?,
        }

        Ok(baseline)
    }

    pub fn overrides(&self) -> FixitResult<Vec<RoutingOverride>> {
        self.storage.routing.overrides()
    }

    pub fn active_overrides(&self, today: NaiveDate) -> FixitResult<Vec<RoutingOverride>> {
        self.storage.routing.active_overrides(today)
    }

    /// Store a new override
    pub fn add_override(&self, input: OverrideInput) -> FixitResult<RoutingOverride> {
        input.validate()?;
        let envelope_name = input.envelope_name.trim();

        let mut routing_override = RoutingOverride::new(envelope_name, input.delta_bps);
        routing_override.remaining_deposits = input.remaining_deposits;
        routing_override.expires_on = input.expires_on;
        routing_override.reason = input.reason;
        routing_override.created_by = input.created_by;
        routing_override.allow_protected_reduction = input.allow_protected_reduction;

        self.storage.routing.insert_override(routing_override.clone())?;
        self.storage.routing.save()?;

        self.storage.log_create(
            EntityType::RoutingOverride,
            routing_override.id.to_string(),
            Some(routing_override.envelope_name.clone()),
            &routing_override,
        )?;

        info!(
            envelope = %routing_override.envelope_name,
            delta_bps = routing_override.delta_bps,
            remaining = ?routing_override.remaining_deposits,
            "stored routing override"
        );

        Ok(routing_override)
    }

    /// Remove an override by id (full or short form)
    pub fn remove_override(&self, query: &str) -> FixitResult<RoutingOverride> {
        let routing_override = self
            .storage
            .routing
            .find_override(query)?
            .ok_or_else(|| FixitError::override_not_found(query))?;

        self.storage.routing.delete_override(routing_override.id)?;
        self.storage.routing.save()?;

        self.storage.log_delete(
            EntityType::RoutingOverride,
            routing_override.id.to_string(),
            Some(routing_override.envelope_name.clone()),
            &routing_override,
        )?;

        Ok(routing_override)
    }

    /// Split `deposit_amount` using baselines and the overrides active on `today`
    pub fn plan_deposit(&self, deposit_amount: Money, today: NaiveDate) -> FixitResult<DepositPlan> {
        let baselines = self.storage.routing.baselines()?;
        let overrides = self.storage.routing.active_overrides(today)?;
        let rules = self.storage.rules.get_all()?;

        debug!(
            deposit = %deposit_amount,
            baselines = baselines.len(),
            overrides = overrides.len(),
            "computing deposit plan"
        );

        compute_deposit_plan(&DepositInput {
            deposit_amount,
            baselines: &baselines,
            overrides: &overrides,
            rules: &rules,
            catch_all: &self.settings.catch_all_envelope,
            max_adjustment: self.settings.max_adjustment_per_deposit,
        })
    }

    /// Record a deposit and count it against active override countdowns
    ///
    /// A repeated idempotency key leaves every countdown untouched.
    pub fn confirm_deposit(
        &self,
        idempotency_key: &str,
        deposit_amount: Money,
        today: NaiveDate,
    ) -> FixitResult<DepositConfirmation> {
        let idempotency_key = idempotency_key.trim();
        if idempotency_key.is_empty() {
            return Err(FixitError::Validation("Idempotency key cannot be empty".into()));
        }

        let plan = self.plan_deposit(deposit_amount, today)?;

        let event = DepositEvent {
            idempotency_key: idempotency_key.to_string(),
            deposit_amount,
            recorded_at: Utc::now(),
        };
        let newly_recorded = self.storage.deposits.try_insert(event.clone())?;
        if !newly_recorded {
            debug!(key = idempotency_key, "deposit already recorded");
            return Ok(DepositConfirmation {
                plan,
                newly_recorded,
                consumed: Vec::new(),
            });
        }

        // Countdowns hit disk before the key does, so a failed save can be retried
        let consumed = self.storage.routing.consume_deposit(today)?;
        self.storage.routing.save()?;
        self.storage.deposits.save()?;

        self.storage.log_create(
            EntityType::DepositEvent,
            idempotency_key,
            None,
            &event,
        )?;
        for routing_override in &consumed {
            let mut before = routing_override.clone();
            before.remaining_deposits = before.remaining_deposits.map(|r| r + 1);
            self.storage.log_update(
                EntityType::RoutingOverride,
                routing_override.id.to_string(),
                Some(routing_override.envelope_name.clone()),
                &before,
                routing_override,
                None,
            )?;
        }

        info!(
            key = idempotency_key,
            deposit = %deposit_amount,
            consumed = consumed.len(),
            "confirmed deposit"
        );

        Ok(DepositConfirmation {
            plan,
            newly_recorded,
            consumed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::FixitPaths;
    use crate::models::{EnvelopeRule, PriorityGroup};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FixitPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn seed(storage: &Storage, settings: &Settings) {
        let service = RoutingService::new(storage, settings);
        service.set_baseline("A", 6000).unwrap();
        service.set_baseline("B", 4000).unwrap();
        for (name, group) in [("A", PriorityGroup::Necessities), ("B", PriorityGroup::Discretionary)] {
            storage
                .rules
                .upsert(EnvelopeRule::new(name, Money::from_dollars(100), group))
                .unwrap();
        }
    }

    #[test]
    fn test_plan_deposit_from_baselines() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        seed(&storage, &settings);

        let plan = RoutingService::new(&storage, &settings)
            .plan_deposit(Money::from_dollars(2500), date(2025, 3, 1))
            .unwrap();

        assert_eq!(plan.line("A").unwrap().amount, Money::from_dollars(1500));
        assert_eq!(plan.line("B").unwrap().amount, Money::from_dollars(1000));
        assert_eq!(plan.total_amount(), Money::from_dollars(2500));
    }

    #[test]
    fn test_confirm_deposit_is_idempotent() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        seed(&storage, &settings);
        let service = RoutingService::new(&storage, &settings);

        let added = service
            .add_override(OverrideInput {
                envelope_name: "A".into(),
                delta_bps: 500,
                remaining_deposits: Some(2),
                ..OverrideInput::default()
            })
            .unwrap();

        let today = date(2025, 3, 1);
        let first = service
            .confirm_deposit("dep-1", Money::from_dollars(2500), today)
            .unwrap();
        assert!(first.newly_recorded);
        assert_eq!(first.consumed.len(), 1);
        assert_eq!(first.plan.line("A").unwrap().bps, 6500);
        assert_eq!(first.plan.line("B").unwrap().bps, 3500);

        let repeat = service
            .confirm_deposit("dep-1", Money::from_dollars(2500), today)
            .unwrap();
        assert!(!repeat.newly_recorded);
        assert!(repeat.consumed.is_empty());

        let stored = storage.routing.find_override(&added.id.to_string()).unwrap().unwrap();
        assert_eq!(stored.remaining_deposits, Some(1));

        service
            .confirm_deposit("dep-2", Money::from_dollars(2500), today)
            .unwrap();
        assert!(service.active_overrides(today).unwrap().is_empty());
        let plan = service.plan_deposit(Money::from_dollars(2500), today).unwrap();
        assert_eq!(plan.line("A").unwrap().bps, 6000);
    }

    #[test]
    fn test_confirm_deposit_retry_after_failed_save() {
        let (temp, storage) = create_test_storage();
        let settings = Settings::default();
        seed(&storage, &settings);
        storage.rules.save().unwrap();
        let service = RoutingService::new(&storage, &settings);
        let added = service
            .add_override(OverrideInput {
                envelope_name: "A".into(),
                delta_bps: 500,
                remaining_deposits: Some(2),
                ..OverrideInput::default()
            })
            .unwrap();

        let routing_file = storage.paths().routing_file();
        let parked = routing_file.with_extension("parked");
        std::fs::rename(&routing_file, &parked).unwrap();
        std::fs::create_dir(&routing_file).unwrap();

        let today = date(2025, 3, 1);
        assert!(service
            .confirm_deposit("dep-1", Money::from_dollars(2500), today)
            .is_err());
        assert!(!storage.paths().deposits_file().exists());

        std::fs::remove_dir(&routing_file).unwrap();
        std::fs::rename(&parked, &routing_file).unwrap();

        let mut reloaded = Storage::new(FixitPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        reloaded.load_all().unwrap();
        let retry = RoutingService::new(&reloaded, &settings)
            .confirm_deposit("dep-1", Money::from_dollars(2500), today)
            .unwrap();
        assert!(retry.newly_recorded);
        assert_eq!(retry.consumed.len(), 1);
        let stored = reloaded
            .routing
            .find_override(&added.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(stored.remaining_deposits, Some(1));
    }

    #[test]
    fn test_add_override_validation() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = RoutingService::new(&storage, &settings);

        let zero = OverrideInput {
            envelope_name: "A".into(),
            ..OverrideInput::default()
        };
        assert!(service.add_override(zero).unwrap_err().is_validation());

        let no_deposits = OverrideInput {
            envelope_name: "A".into(),
            delta_bps: 100,
            remaining_deposits: Some(0),
            ..OverrideInput::default()
        };
        assert!(service.add_override(no_deposits).unwrap_err().is_validation());
    }

    #[test]
    fn test_remove_override_by_short_id() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = RoutingService::new(&storage, &settings);

        let added = service
            .add_override(OverrideInput {
                envelope_name: "A".into(),
                delta_bps: -200,
                ..OverrideInput::default()
            })
            .unwrap();

        let removed = service.remove_override(&added.id.to_string()).unwrap();
        assert_eq!(removed.id, added.id);
        assert!(service.overrides().unwrap().is_empty());
        assert!(service
            .remove_override(&added.id.to_string())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_set_baseline_audits_update() {
        let (_temp, storage) = create_test_storage();
        let settings = Settings::default();
        let service = RoutingService::new(&storage, &settings);

        service.set_baseline("A", 6000).unwrap();
        service.set_baseline("A", 5500).unwrap();
        assert!(service.set_baseline("A", 10_001).unwrap_err().is_validation());

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].changes.as_deref(), Some("bps: 6000 -> 5500"));
    }
}
