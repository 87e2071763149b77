//! Append-only audit trail stored as JSON lines next to the data files

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::error::{FixitError, FixitResult};

use super::entry::AuditEntry;

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one entry as a single line
    pub fn append(&self, entry: &AuditEntry) -> FixitResult<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| FixitError::Json(format!("Failed to serialize audit entry: {}", e)))?;
        line.push('\n');

        // One write per entry keeps lines whole when two commands append at once
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|e| {
                FixitError::Io(format!("Failed to append to {}: {}", self.path.display(), e))
            })
    }

    /// Every entry, oldest first
    pub fn read_all(&self) -> FixitResult<Vec<AuditEntry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FixitError::Io(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| {
                    FixitError::Json(format!("Audit log line {} is not an entry: {}", index + 1, e))
                })
            })
            .collect()
    }

    /// The last `limit` entries, oldest first
    pub fn tail(&self, limit: usize) -> FixitResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let keep_from = entries.len().saturating_sub(limit);
        Ok(entries.split_off(keep_from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{Action, EntityType};
    use serde_json::json;
    use tempfile::TempDir;

    fn deposit_entry(key: &str) -> AuditEntry {
        AuditEntry::new(Action::Created, EntityType::DepositEvent, key, None)
            .with_states(None, Some(&json!({"idempotencyKey": key})))
    }

    #[test]
    fn test_append_and_read_back() {
        let temp = TempDir::new().unwrap();
        let log = AuditLog::new(temp.path().join("audit.log"));

        log.append(&deposit_entry("dep-1")).unwrap();
        log.append(&deposit_entry("dep-2")).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entity_id, "dep-1");
        assert_eq!(entries[1].action, Action::Created);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("audit.log"))
                .unwrap()
                .lines()
                .count(),
            2
        );
    }

    #[test]
    fn test_tail_keeps_newest_in_order() {
        let temp = TempDir::new().unwrap();
        let log = AuditLog::new(temp.path().join("audit.log"));
        for i in 0..10 {
            log.append(&deposit_entry(&format!("dep-{}", i))).unwrap();
        }

        let ids: Vec<String> = log.tail(3).unwrap().into_iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec!["dep-7", "dep-8", "dep-9"]);
        assert_eq!(log.tail(50).unwrap().len(), 10);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let log = AuditLog::new(temp.path().join("audit.log"));
        assert!(log.read_all().unwrap().is_empty());
        assert!(log.tail(5).unwrap().is_empty());
    }

    #[test]
    fn test_bad_line_reports_its_number() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("audit.log"), "\nnot json\n").unwrap();

        let err = AuditLog::new(temp.path().join("audit.log")).read_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
