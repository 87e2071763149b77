//! Envelope rule repository for JSON storage
//!
//! Manages loading and saving rules to rules.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FixitError;
use crate::models::{EnvelopeRule, RuleId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RuleData {
    #[serde(default)]
    rules: Vec<EnvelopeRule>,
}

/// Repository for envelope rule persistence
pub struct RuleRepository {
    path: PathBuf,
    data: RwLock<HashMap<RuleId, EnvelopeRule>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load rules from disk
    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: RuleData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for rule in file_data.rules {
            data.insert(rule.id, rule);
        }

        Ok(())
    }

    /// Save rules to disk, sorted by name
    pub fn save(&self) -> Result<(), FixitError> {
        let file_data = RuleData {
            rules: self.get_all()?,
        };

        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: RuleId) -> Result<Option<EnvelopeRule>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Get all rules sorted by name
    pub fn get_all(&self) -> Result<Vec<EnvelopeRule>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut rules: Vec<_> = data.values().cloned().collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rules)
    }

    /// Find a rule by exact name first, then by case-insensitive name or alias
    pub fn get_by_name(&self, name: &str) -> Result<Option<EnvelopeRule>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let exact = data.values().find(|r| r.name == name);
        Ok(exact
            .or_else(|| data.values().find(|r| r.matches_name(name)))
            .cloned())
    }

    /// Insert or update a rule
    pub fn upsert(&self, rule: EnvelopeRule) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(rule.id, rule);
        Ok(())
    }

    pub fn delete(&self, id: RuleId) -> Result<bool, FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.remove(&id).is_some())
    }

    pub fn count(&self) -> Result<usize, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }
}
