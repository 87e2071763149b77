//! User settings for envelope-fixit
//!
//! Routing and planning defaults. Every field has a default so older or
//! hand-edited config files keep loading.

use serde::{Deserialize, Serialize};

use super::paths::FixitPaths;
use crate::error::FixitError;
use crate::models::Money;

/// User settings for envelope-fixit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Envelope that receives the unallocated remainder of every deposit
    #[serde(default = "default_catch_all")]
    pub catch_all_envelope: String,

    /// Largest dollar change routing may make to one envelope per deposit
    #[serde(default = "default_max_adjustment")]
    pub max_adjustment_per_deposit: Money,

    /// Expected size of a paycheck deposit, used to express dollars as bps
    #[serde(default = "default_deposit_assumption")]
    pub deposit_amount_assumption: Money,

    /// Deposits a routing fix is spread over when no restore window is given
    #[serde(default = "default_routing_deposits")]
    pub routing_deposits: u32,

    /// Days between deposits
    #[serde(default = "default_cadence_days")]
    pub deposit_cadence_days: u32,

    /// How far ahead a due date counts as "due soon"
    #[serde(default = "default_due_soon_window")]
    pub due_soon_window_days: u32,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_catch_all() -> String {
    "Move to ___".to_string()
}

fn default_max_adjustment() -> Money {
    Money::from_dollars(200)
}

fn default_deposit_assumption() -> Money {
    Money::from_dollars(2500)
}

fn default_routing_deposits() -> u32 {
    2
}

fn default_cadence_days() -> u32 {
    14
}

fn default_due_soon_window() -> u32 {
    7
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            catch_all_envelope: default_catch_all(),
            max_adjustment_per_deposit: default_max_adjustment(),
            deposit_amount_assumption: default_deposit_assumption(),
            routing_deposits: default_routing_deposits(),
            deposit_cadence_days: default_cadence_days(),
            due_soon_window_days: default_due_soon_window(),
            currency_symbol: default_currency(),
        }
    }
}

impl Settings {
    /// Number of deposits needed to restore within `restore_days`
    ///
    /// Falls back to `routing_deposits` when no window (or a zero window) is given.
    pub fn routing_deposits_for(&self, restore_days: Option<u32>) -> u32 {
        match restore_days {
            Some(days) if days > 0 => {
                let cadence = self.deposit_cadence_days.max(1);
                days.div_ceil(cadence).max(1)
            }
            _ => self.routing_deposits.max(1),
        }
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &FixitPaths) -> Result<Self, FixitError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| FixitError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                FixitError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FixitPaths) -> Result<(), FixitError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| FixitError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FixitError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
