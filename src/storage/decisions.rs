//! Pending decision repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FixitError;
use crate::models::{DecisionToken, PendingDecision};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct DecisionData {
    #[serde(default)]
    decisions: Vec<PendingDecision>,
}

pub struct DecisionRepository {
    path: PathBuf,
    data: RwLock<HashMap<DecisionToken, PendingDecision>>,
}

impl DecisionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FixitError> {
        let file_data: DecisionData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for decision in file_data.decisions {
            data.insert(decision.token, decision);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FixitError> {
        let file_data = DecisionData {
            decisions: self.get_all()?,
        };

        write_json_atomic(&self.path, &file_data)
    }

    /// All decisions, oldest first
    pub fn get_all(&self) -> Result<Vec<PendingDecision>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut decisions: Vec<_> = data.values().cloned().collect();
        decisions.sort_by_key(|d| d.created_at);
        Ok(decisions)
    }

    /// Find a decision by full or short token
    pub fn find(&self, token: &str) -> Result<Option<PendingDecision>, FixitError> {
        let data = self
            .data
            .read()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().find(|d| d.matches_token(token)).cloned())
    }

    /// The newest decision that has not been applied yet
    pub fn latest_pending(&self) -> Result<Option<PendingDecision>, FixitError> {
        Ok(self
            .get_all()?
            .into_iter()
            .rev()
            .find(|d| !d.is_applied()))
    }

    pub fn upsert(&self, decision: PendingDecision) -> Result<(), FixitError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| FixitError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(decision.token, decision);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionSource, OptionId};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_latest_pending_skips_applied() {
        let temp_dir = TempDir::new().unwrap();
        let repo = DecisionRepository::new(temp_dir.path().join("decisions.json"));

        let mut older = PendingDecision::new(DecisionSource::Issues, Vec::new());
        older.created_at = Utc::now() - Duration::minutes(5);
        let mut newer = PendingDecision::new(DecisionSource::Transfer, Vec::new());
        newer.mark_applied(OptionId::A);

        repo.upsert(older.clone()).unwrap();
        repo.upsert(newer).unwrap();

        assert_eq!(repo.latest_pending().unwrap().unwrap().token, older.token);
    }

    #[test]
    fn test_find_by_short_token_after_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decisions.json");
        let repo = DecisionRepository::new(path.clone());
        let decision = PendingDecision::new(DecisionSource::Issues, Vec::new());
        let short = decision.token.to_string();
        repo.upsert(decision).unwrap();
        repo.save().unwrap();

        let repo2 = DecisionRepository::new(path);
        repo2.load().unwrap();
        assert!(repo2.find(&short).unwrap().is_some());
        assert!(repo2.find("dec-nothere").unwrap().is_none());
    }
}
