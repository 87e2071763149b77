//! Daily pod balance snapshots
//!
//! One balance per envelope per day, used to tell whether an envelope was
//! actually funded on a past due date. Only the most recent
//! [`SNAPSHOT_RETENTION_DAYS`] days are kept.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::engine::SnapshotBalances;
use crate::error::FixitError;
use crate::models::Money;

use super::file_io::{read_json, write_json_atomic};

/// Number of distinct days kept on disk
pub const SNAPSHOT_RETENTION_DAYS: usize = 180;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct SnapshotData {
    #[serde(default)]
    days: BTreeMap<NaiveDate, BTreeMap<String, Money>>,
}

/// Repository for per-day envelope balances
pub struct SnapshotRepository {
    path: PathBuf,
    data: RwLock<SnapshotData>,
}

impl SnapshotRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(SnapshotData::default()),
        }
    }

    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: SnapshotData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *data = file_data;
        Ok(())
    }

    pub fn save(&self) -> Result<(), FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        write_json_atomic(&self.path, &*data)
    }

    /// Record an envelope's balance for `date`, replacing any earlier value that day
    pub fn record(&self, date: NaiveDate, envelope_name: &str, balance: Money) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.days
            .entry(date)
            .or_default()
            .insert(envelope_name.to_string(), balance);

        while data.days.len() > SNAPSHOT_RETENTION_DAYS {
            data.days.pop_first();
        }

        Ok(())
    }

    /// Balances recorded on `date`
    pub fn balances_on(&self, date: NaiveDate) -> Result<BTreeMap<String, Money>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.days.get(&date).cloned().unwrap_or_default())
    }

    /// Build the due-date lookup the issue detector consumes
    ///
    /// Every requested envelope gets an entry; `None` means no snapshot existed.
    pub fn lookup(
        &self,
        wanted: &[(String, NaiveDate)],
    ) -> Result<SnapshotBalances, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(wanted
            .iter()
            .map(|(name, date)| {
                let balance = data.days.get(date).and_then(|day| day.get(name)).copied();
                (name.clone(), balance)
            })
            .collect())
    }

    pub fn day_count(&self) -> Result<usize, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.days.len())
    }
}
