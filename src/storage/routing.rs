//! Routing repository for JSON storage
//!
//! Baselines and overrides share routing.json. Overrides are never deleted by
//! routing itself; exhausted or expired ones simply stop being active.

use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::FixitError;
use crate::models::{OverrideId, RoutingBaseline, RoutingOverride, TOTAL_BPS};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RoutingData {
    #[serde(default)]
    baselines: Vec<RoutingBaseline>,
    #[serde(default)]
    overrides: Vec<RoutingOverride>,
}

/// Repository for routing baselines and overrides
pub struct RoutingRepository {
    path: PathBuf,
    data: RwLock<RoutingData>,
}

impl RoutingRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(RoutingData::default()),
        }
    }

    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: RoutingData = read_json(&self.path)?;

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

    /// All baselines sorted by envelope name
    pub fn baselines(&self) -> Result<Vec<RoutingBaseline>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut baselines = data.baselines.clone();
        baselines.sort_by(|a, b| a.envelope_name.cmp(&b.envelope_name));
        Ok(baselines)
    }

    /// Set the baseline for an envelope, returning the previous one
    pub fn upsert_baseline(
        &self,
        envelope_name: &str,
        bps: i64,
    ) -> Result<Option<RoutingBaseline>, FixitError> {
        if !(0..=TOTAL_BPS).contains(&bps) {
            return Err(FixitError::Validation(format!(
                "Baseline bps must be between 0 and {}, got {}",
                TOTAL_BPS, bps
            )));
        }

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let baseline = RoutingBaseline::new(envelope_name, bps);
        let existing = data
            .baselines
            .iter()
            .position(|b| b.envelope_name == envelope_name);
        match existing {
            Some(index) => Ok(Some(std::mem::replace(&mut data.baselines[index], baseline))),
            None => {
                data.baselines.push(baseline);
                Ok(None)
            }
        }
    }

    /// Replace every baseline at once
    pub fn replace_baselines(&self, baselines: Vec<RoutingBaseline>) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.baselines = baselines;
        Ok(())
    }

    /// All overrides ordered by creation time
    pub fn overrides(&self) -> Result<Vec<RoutingOverride>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut overrides = data.overrides.clone();
        overrides.sort_by_key(|o| o.created_at);
        Ok(overrides)
    }

    /// Overrides with deposits left that have not expired by `today`
    pub fn active_overrides(&self, today: NaiveDate) -> Result<Vec<RoutingOverride>, FixitError> {
        Ok(self
            .overrides()?
            .into_iter()
            .filter(|o| o.is_active_on(today))
            .collect())
    }

    pub fn insert_override(&self, routing_override: RoutingOverride) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.overrides.push(routing_override);
        Ok(())
    }

    /// Find an override by full id or its short display form
    pub fn find_override(&self, query: &str) -> Result<Option<RoutingOverride>, FixitError> {
        Ok(self.overrides()?.into_iter().find(|o| o.id.matches(query)))
    }

    pub fn delete_override(&self, id: OverrideId) -> Result<bool, FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let before = data.overrides.len();
        data.overrides.retain(|o| o.id != id);
        Ok(data.overrides.len() != before)
    }

    /// Decrement the countdown of every override active on `today`
    ///
    /// Returns the overrides after the change, for those that had a countdown.
    pub fn consume_deposit(&self, today: NaiveDate) -> Result<Vec<RoutingOverride>, FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut consumed = Vec::new();
        for o in data.overrides.iter_mut() {
            if o.is_active_on(today) && o.consume_deposit() {
                consumed.push(o.clone());
            }
        }
        Ok(consumed)
    }
}
