//! Audit log CLI command

use crate::display::format_audit_entries;
use crate::error::FixitResult;
use crate::storage::Storage;

/// Show the most recent audit entries, oldest first
pub fn handle_audit_command(storage: &Storage, limit: usize) -> FixitResult<()> {
    let entries = storage.audit().tail(limit)?;
    print!("{}", format_audit_entries(&entries));
    Ok(())
}
