//! Path management for envelope-fixit
//!
//! ## Path Resolution Order
//!
//! 1. `FIXIT_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/envelope-fixit` or `~/.config/envelope-fixit`
//! 3. Windows: `%APPDATA%\envelope-fixit`

use std::path::PathBuf;

use crate::error::FixitError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "FIXIT_DATA_DIR";

/// Manages all paths used by envelope-fixit
#[derive(Debug, Clone)]
pub struct FixitPaths {
    base_dir: PathBuf,
}

impl FixitPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, FixitError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create FixitPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Envelope rules
    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    /// Routing baselines and overrides
    pub fn routing_file(&self) -> PathBuf {
        self.data_dir().join("routing.json")
    }

    /// Current account and pod balances
    pub fn balances_file(&self) -> PathBuf {
        self.data_dir().join("balances.json")
    }

    /// Daily per-envelope balance snapshots
    pub fn snapshots_file(&self) -> PathBuf {
        self.data_dir().join("snapshots.json")
    }

    /// Confirmed deposit events keyed by idempotency key
    pub fn deposits_file(&self) -> PathBuf {
        self.data_dir().join("deposits.json")
    }

    /// Pending fix decisions
    pub fn decisions_file(&self) -> PathBuf {
        self.data_dir().join("decisions.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), FixitError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| FixitError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| FixitError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if envelope-fixit has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, FixitError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                FixitError::Config("Could not determine HOME directory".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("envelope-fixit"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, FixitError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| FixitError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("envelope-fixit"))
}
