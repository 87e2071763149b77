//! Deposit event repository
//!
//! Records confirmed deposits by idempotency key so the same deposit is
//! never counted against override countdowns twice.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FixitError;
use crate::models::DepositEvent;

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct DepositData {
    #[serde(default)]
    events: Vec<DepositEvent>,
}

pub struct DepositRepository {
    path: PathBuf,
    data: RwLock<HashMap<String, DepositEvent>>,
}

impl DepositRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: DepositData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for event in file_data.events {
            data.insert(event.idempotency_key.clone(), event);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FixitError> {
        let file_data = DepositData {
            events: self.get_all()?,
        };

        write_json_atomic(&self.path, &file_data)
    }

    /// All events, oldest first
    pub fn get_all(&self) -> Result<Vec<DepositEvent>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut events: Vec<_> = data.values().cloned().collect();
        events.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.idempotency_key.cmp(&b.idempotency_key))
        });
        Ok(events)
    }

    /// Insert the event unless its key was seen before; returns whether it was new
    pub fn try_insert(&self, event: DepositEvent) -> Result<bool, FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if data.contains_key(&event.idempotency_key) {
            return Ok(false);
        }
        data.insert(event.idempotency_key.clone(), event);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::Utc;
    use tempfile::TempDir;

    fn event(key: &str) -> DepositEvent {
        DepositEvent {
            idempotency_key: key.to_string(),
            deposit_amount: Money::from_dollars(2500),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_try_insert_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let repo = DepositRepository::new(temp_dir.path().join("deposits.json"));

        assert!(repo.try_insert(event("paycheck-2025-03-14")).unwrap());
        assert!(!repo.try_insert(event("paycheck-2025-03-14")).unwrap());
        assert!(repo.try_insert(event("paycheck-2025-03-28")).unwrap());
        assert_eq!(repo.get_all().unwrap().len(), 2);
    }

    #[test]
    fn test_keys_survive_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deposits.json");
        let repo = DepositRepository::new(path.clone());
        repo.try_insert(event("k1")).unwrap();
        repo.save().unwrap();

        let repo2 = DepositRepository::new(path);
        repo2.load().unwrap();
        assert!(!repo2.try_insert(event("k1")).unwrap());
    }
}
