//! Balance repository for JSON storage
//!
//! Holds the most recent balance reported for each account, keyed by name.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FixitError;
use crate::models::AccountBalance;

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BalanceData {
    #[serde(default)]
    accounts: Vec<AccountBalance>,
}

/// Repository for current account balances
pub struct BalanceRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<String, AccountBalance>>,
}

impl BalanceRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: BalanceData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for account in file_data.accounts {
            data.insert(account.name.clone(), account);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FixitError> {
        let file_data = BalanceData {
            accounts: self.get_all()?,
        };

        write_json_atomic(&self.path, &file_data)
    }

    /// All accounts sorted by name
    pub fn get_all(&self) -> Result<Vec<AccountBalance>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().cloned().collect())
    }

    pub fn get(&self, name: &str) -> Result<Option<AccountBalance>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(name).cloned())
    }

    /// Set (or replace) an account's balance
    pub fn set(&self, account: AccountBalance) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(account.name.clone(), account);
        Ok(())
    }

    /// Forget an account entirely
    pub fn remove(&self, name: &str) -> Result<bool, FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, Money};
    use tempfile::TempDir;

    #[test]
    fn test_set_replaces_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = BalanceRepository::new(temp_dir.path().join("balances.json"));

        repo.set(AccountBalance::pod("Rent", Some(Money::from_dollars(100))))
            .unwrap();
        repo.set(AccountBalance::pod("Rent", Some(Money::from_dollars(900))))
            .unwrap();

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].balance, Some(Money::from_dollars(900)));
    }

    #[test]
    fn test_save_reload_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("balances.json");
        let repo = BalanceRepository::new(path.clone());

        repo.set(AccountBalance {
            name: "Checking".into(),
            kind: AccountKind::Account,
            balance: None,
        })
        .unwrap();
        repo.save().unwrap();

        let repo2 = BalanceRepository::new(path);
        repo2.load().unwrap();
        let checking = repo2.get("Checking").unwrap().unwrap();
        assert_eq!(checking.kind, AccountKind::Account);
        assert_eq!(checking.balance, None);

        assert!(repo2.remove("Checking").unwrap());
        assert!(repo2.get_all().unwrap().is_empty());
    }
}
