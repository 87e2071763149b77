//! Storage initialization
//!
//! Handles first-run setup: directories, empty data files, and a rule for the
//! catch-all envelope so routing always has somewhere to put the remainder.

use crate::config::paths::FixitPaths;
use crate::config::settings::Settings;
use crate::error::FixitError;
use crate::models::{EnvelopeRule, Money, PriorityGroup};

use super::Storage;

/// Initialize storage for a fresh installation
///
/// Existing data is left untouched; only missing pieces are created.
pub fn initialize_storage(paths: &FixitPaths, settings: &Settings) -> Result<Storage, FixitError> {
    paths.ensure_directories()?;

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    if storage.rules.get_by_name(&settings.catch_all_envelope)?.is_none() {
        storage.rules.upsert(EnvelopeRule::new(
            settings.catch_all_envelope.clone(),
            Money::zero(),
            PriorityGroup::Other,
        ))?;
    }

    storage.save_all()?;
    Ok(storage)
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &FixitPaths) -> bool {
    !paths.is_initialized() || !paths.rules_file().exists()
}
