//! Balance service
//!
//! Current account and pod balances as reported by the bank. Setting a pod
//! balance also records it as today's snapshot.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{FixitError, FixitResult};
use crate::models::{AccountBalance, AccountKind, Money};
use crate::storage::Storage;

/// Service for live balances
pub struct BalanceService<'a> {
    storage: &'a Storage,
}

impl<'a> BalanceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn list(&self) -> FixitResult<Vec<AccountBalance>> {
        self.storage.balances.get_all()
    }

    /// Store a balance; `None` marks it as unknown
    pub fn set(
        &self,
        name: &str,
        kind: AccountKind,
        balance: Option<Money>,
        today: NaiveDate,
    ) -> FixitResult<AccountBalance> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FixitError::Validation("Account name cannot be empty".into()));
        }

        let account = AccountBalance {
            name: name.to_string(),
            kind,
            balance,
        };
        self.storage.balances.set(account.clone())?;
        self.storage.balances.save()?;

        if let (true, Some(balance)) = (account.is_pod(), balance) {
            self.storage.snapshots.record(today, name, balance)?;
            self.storage.snapshots.save()?;
        }

        debug!(account = name, kind = %kind, balance = ?balance, "set balance");
        Ok(account)
    }

    pub fn clear(&self, name: &str) -> FixitResult<()> {
        if !self.storage.balances.remove(name.trim())? {
            return Err(FixitError::NotFound {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }
        self.storage.balances.save()
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
    fn test_set_pod_records_snapshot() {
        let (_temp, storage) = create_test_storage();
        let service = BalanceService::new(&storage);
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        service
            .set("Rent", AccountKind::Pod, Some(Money::from_dollars(900)), today)
            .unwrap();
        service
            .set("Checking", AccountKind::Account, Some(Money::from_dollars(50)), today)
            .unwrap();

        let day = storage.snapshots.balances_on(today).unwrap();
        assert_eq!(day.get("Rent"), Some(&Money::from_dollars(900)));
        assert!(!day.contains_key("Checking"));
        assert_eq!(service.list().unwrap().len(), 2);
    }

    #[test]
    fn test_clear() {
        let (_temp, storage) = create_test_storage();
        let service = BalanceService::new(&storage);
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        service.set("Rent", AccountKind::Pod, None, today).unwrap();
        service.clear("Rent").unwrap();
        assert!(service.list().unwrap().is_empty());
        assert!(service.clear("Rent").unwrap_err().is_not_found());
    }
}
