//! YAML Export functionality
//!
//! Exports an owner's data to YAML for human-readable backup.

use std::io::Write;

use crate::error::{FinanceError, FinanceResult};
use crate::export::json::OwnerExport;
use crate::models::Owner;
use crate::storage::Storage;

/// Export an owner's data to YAML format
pub fn export_owner_yaml<W: Write>(
    storage: &Storage,
    owner: &Owner,
    writer: &mut W,
) -> FinanceResult<()> {
    let export = OwnerExport::from_storage(storage, owner)?;

    writeln!(writer, "# FinTrack export for {}", export.owner)?;
    writeln!(writer, "# Generated: {}", export.exported_at)?;
    writeln!(writer, "# App Version: {}", export.app_version)?;
    writeln!(writer)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| FinanceError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> FinanceResult<OwnerExport> {
    let export: OwnerExport =
        serde_yaml::from_str(yaml_str).map_err(|e| FinanceError::Export(e.to_string()))?;
    export.validate().map_err(FinanceError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::FinTrackPaths;
    use crate::models::{Money, Transaction, TransactionKind};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_yaml_export() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinTrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let alice = Owner::new("alice").unwrap();

        storage
            .transactions
            .upsert(Transaction::new(
                alice.clone(),
                TransactionKind::Income,
                "Salary",
                Money::from_cents(250_000),
                "EUR",
                Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
                Utc::now(),
            ))
            .unwrap();

        let mut output = Vec::new();
        export_owner_yaml(&storage, &alice, &mut output).unwrap();
        let yaml_str = String::from_utf8(output).unwrap();

        assert!(yaml_str.starts_with("# FinTrack export for alice"));
        assert!(yaml_str.contains("schema_version"));
        assert!(yaml_str.contains("Salary"));

        let export = import_from_yaml(&yaml_str).unwrap();
        assert_eq!(export.transactions.len(), 1);
        assert_eq!(export.transactions[0].currency, "EUR");
    }
}
