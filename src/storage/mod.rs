//! Storage layer for envelope-fixit
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. Each repository owns one file under `data/`.

pub mod balances;
pub mod decisions;
pub mod deposits;
pub mod file_io;
pub mod init;
pub mod routing;
pub mod rules;
pub mod snapshots;

pub use balances::BalanceRepository;
pub use decisions::DecisionRepository;
pub use deposits::DepositRepository;
pub use init::initialize_storage;
pub use routing::RoutingRepository;
pub use rules::RuleRepository;
pub use snapshots::SnapshotRepository;

use serde::Serialize;

use crate::audit::{Action, AuditEntry, AuditLog, EntityType};
use crate::config::paths::FixitPaths;
use crate::error::{FixitError, FixitResult};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: FixitPaths,
    pub rules: RuleRepository,
    pub routing: RoutingRepository,
    pub balances: BalanceRepository,
    pub snapshots: SnapshotRepository,
    pub deposits: DepositRepository,
    pub decisions: DecisionRepository,
    audit: AuditLog,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: FixitPaths) -> Result<Self, FixitError> {
        paths.ensure_directories()?;

        Ok(Self {
            rules: RuleRepository::new(paths.rules_file()),
            routing: RoutingRepository::new(paths.routing_file()),
            balances: BalanceRepository::new(paths.balances_file()),
            snapshots: SnapshotRepository::new(paths.snapshots_file()),
            deposits: DepositRepository::new(paths.deposits_file()),
            decisions: DecisionRepository::new(paths.decisions_file()),
            audit: AuditLog::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &FixitPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), FixitError> {
        self.rules.load()?;
        self.routing.load()?;
        self.balances.load()?;
        self.snapshots.load()?;
        self.deposits.load()?;
        self.decisions.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), FixitError> {
        self.rules.save()?;
        self.routing.save()?;
        self.balances.save()?;
        self.snapshots.save()?;
        self.deposits.save()?;
        self.decisions.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Record a newly stored entity in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FixitResult<()> {
        self.audit.append(
            &AuditEntry::new(Action::Created, entity_type, entity_id, entity_name)
                .with_states(None, Some(entity)),
        )
    }

    /// Record a change in the audit log
    ///
    /// `changes` replaces the computed field diff when given.
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        changes: Option<String>,
    ) -> FixitResult<()> {
        self.audit.append(
            &AuditEntry::new(Action::Updated, entity_type, entity_id, entity_name)
                .with_states(Some(before), Some(after))
                .with_changes(changes),
        )
    }

    /// Record a removal in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> FixitResult<()> {
        self.audit.append(
            &AuditEntry::new(Action::Removed, entity_type, entity_id, entity_name)
                .with_states(Some(entity), None),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnvelopeRule, Money, PriorityGroup};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FixitPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_save_all_and_load_all() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FixitPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        storage
            .rules
            .upsert(EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities))
            .unwrap();
        storage.routing.upsert_baseline("Rent", 6000).unwrap();
        storage.save_all().unwrap();

        let mut reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        assert_eq!(reloaded.rules.count().unwrap(), 1);
        assert_eq!(reloaded.routing.baselines().unwrap()[0].bps, 6000);
    }

    #[test]
    fn test_audit_helpers_append_to_log() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FixitPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        let before = EnvelopeRule::new("Rent", Money::from_dollars(1500), PriorityGroup::Necessities);
        let mut after = before.clone();
        after.protected = true;

        storage
            .log_create(EntityType::EnvelopeRule, before.id.to_string(), Some("Rent".into()), &before)
            .unwrap();
        storage
            .log_update(
                EntityType::EnvelopeRule,
                after.id.to_string(),
                Some("Rent".into()),
                &before,
                &after,
                Some("protected: false -> true".into()),
            )
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].changes.as_deref(), Some("protected: false -> true"));
    }
}
