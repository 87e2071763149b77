//! CLI command handler for budget CSV import

use std::path::Path;

use crate::config::settings::Settings;
use crate::display::format_import_summary;
use crate::error::{FixitError, FixitResult};
use crate::services::ImportService;
use crate::storage::Storage;

/// Handle the import command
pub fn handle_import_command(
    storage: &Storage,
    settings: &Settings,
    file: &str,
    overrides: Option<&str>,
    income: Option<&str>,
) -> FixitResult<()> {
    let path = Path::new(file);
    if !path.exists() {
        return Err(FixitError::Import(format!("File not found: {}", file)));
    }

    let service = ImportService::new(storage, settings);
    let summary = service.import_files(path, overrides.map(Path::new), income.map(Path::new))?;

    println!("Imported {} envelope(s) from {}", summary.envelope_count, file);
    println!();
    print!("{}", format_import_summary(&summary));

    Ok(())
}
