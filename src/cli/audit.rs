//! Audit log CLI command

use crate::error::FinanceResult;
use crate::models::Owner;
use crate::storage::Storage;

/// Print the most recent audit entries of `owner`, newest first
pub fn handle_audit_command(storage: &Storage, owner: &Owner, limit: usize) -> FinanceResult<()> {
    let entries = storage.audit().read_recent_for(owner, limit)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
