//! JSON data files
//!
//! Each repository owns one file in the data directory. A missing or empty
//! file loads as the empty default. Saves write a sibling `.tmp` file, sync
//! it, then rename it over the original, so an interrupted save leaves the
//! previous contents in place.

use std::ffi::OsString;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::FixitError;

fn storage_error(action: &str, path: &Path, err: impl Display) -> FixitError {
    FixitError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("data"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load a data file, or `T::default()` when there is nothing stored yet
pub fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, FixitError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(storage_error("read", path, e)),
    };
    if text.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&text).map_err(|e| storage_error("parse", path, e))
}

/// Replace a data file with `data` as pretty JSON
pub fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<(), FixitError> {
    let mut json = serde_json::to_vec_pretty(data).map_err(|e| storage_error("serialize", path, e))?;
    json.push(b'\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error("create directory for", path, e))?;
    }

    let temp = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&temp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp);
        return Err(storage_error("write", path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    type Budgets = BTreeMap<String, i64>;

    fn budgets() -> Budgets {
        [("Rent".to_string(), 150_000), ("Fun".to_string(), 10_000)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_missing_or_empty_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rules.json");

        let loaded: Budgets = read_json(&path).unwrap();
        assert!(loaded.is_empty());

        fs::write(&path, "  \n").unwrap();
        let loaded: Budgets = read_json(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_replaces_contents_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("rules.json");

        write_json_atomic(&path, &Budgets::new()).unwrap();
        write_json_atomic(&path, &budgets()).unwrap();

        let loaded: Budgets = read_json(&path).unwrap();
        assert_eq!(loaded, budgets());
        assert!(!temp_dir.path().join("data").join("rules.json.tmp").exists());
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_failed_save_keeps_target_and_cleans_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routing.json");
        fs::create_dir(&path).unwrap();

        let err = write_json_atomic(&path, &budgets()).unwrap_err();
        assert!(matches!(err, FixitError::Storage(_)));
        assert!(path.is_dir());
        assert!(!temp_dir.path().join("routing.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rules.json");
        fs::write(&path, "not json at all").unwrap();

        let err = read_json::<Budgets>(&path).unwrap_err();
        assert!(matches!(err, FixitError::Storage(_)));
        let message = err.to_string();
        assert!(message.contains("Failed to parse"));
        assert!(message.contains("rules.json"));
    }
}
