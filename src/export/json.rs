//! JSON Export functionality
//!
//! Exports everything one owner has to JSON with schema versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Budget, Goal, Owner, RecurringSeries, Transaction};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full export of one owner's data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub owner: Owner,

    pub transactions: Vec<Transaction>,

    pub budgets: Vec<Budget>,

    pub goals: Vec<Goal>,

    /// Recurring series job rows, including finished ones
    pub series: Vec<RecurringSeries>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub transaction_count: usize,
    pub budget_count: usize,
    pub goal_count: usize,
    pub series_count: usize,
    /// Date of the earliest transaction
    pub earliest_transaction: Option<String>,
    /// Date of the latest transaction
    pub latest_transaction: Option<String>,
}

impl OwnerExport {
    /// Collect an owner's data from storage
    pub fn from_storage(storage: &Storage, owner: &Owner) -> FinanceResult<Self> {
        let mut transactions = storage.transactions.get_by_owner(owner)?;
        transactions.reverse();
        let budgets = storage.budgets.get_by_owner(owner)?;
        let goals = storage.goals.get_by_owner(owner)?;
        let series = storage.series.get_by_owner(owner)?;

        let day = |t: &Transaction| t.occurred_at.format("%Y-%m-%d").to_string();
        let metadata = ExportMetadata {
            transaction_count: transactions.len(),
            budget_count: budgets.len(),
            goal_count: goals.len(),
            series_count: series.len(),
            earliest_transaction: transactions.iter().min_by_key(|t| t.occurred_at).map(day),
            latest_transaction: transactions.iter().max_by_key(|t| t.occurred_at).map(day),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            owner: owner.clone(),
            transactions,
            budgets,
            goals,
            series,
            metadata,
        })
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let foreign = self
            .transactions
            .iter()
            .map(|t| &t.owner)
            .chain(self.budgets.iter().map(|b| &b.owner))
            .chain(self.goals.iter().map(|g| &g.owner))
            .chain(self.series.iter().map(|s| &s.owner))
            .find(|o| **o != self.owner);
        if let Some(other) = foreign {
            return Err(format!(
                "Export for {} contains data owned by {}",
                self.owner, other
            ));
        }

        let goal_ids: HashSet<_> = self.goals.iter().map(|g| g.id).collect();
        for txn in &self.transactions {
            if let Some(goal_id) = txn.goal_id {
                if !goal_ids.contains(&goal_id) {
                    return Err(format!(
                        "Transaction {} references unknown goal {}",
                        txn.id, goal_id
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Export an owner's data to JSON
pub fn export_owner_json<W: Write>(
    storage: &Storage,
    owner: &Owner,
    writer: &mut W,
    pretty: bool,
) -> FinanceResult<()> {
    let export = OwnerExport::from_storage(storage, owner)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| FinanceError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> FinanceResult<OwnerExport> {
    let export: OwnerExport =
        serde_json::from_str(json_str).map_err(|e| FinanceError::Export(e.to_string()))?;
    export.validate().map_err(FinanceError::Export)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::FinTrackPaths;
    use crate::models::{BudgetPeriod, Money, TransactionKind};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinTrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_json_export_is_owner_scoped() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = Owner::new("alice").unwrap();
        let bob = Owner::new("bob").unwrap();

        for (owner, day) in [(&alice, 3), (&alice, 9), (&bob, 5)] {
            storage
                .transactions
                .upsert(Transaction::new(
                    owner.clone(),
                    TransactionKind::Expense,
                    "Food",
                    Money::from_cents(1200),
                    "USD",
                    Utc.with_ymd_and_hms(2025, 2, day, 8, 0, 0).unwrap(),
                    Utc::now(),
                ))
                .unwrap();
        }
        storage
            .budgets
            .upsert(Budget::new(
                alice.clone(),
                "Food",
                Money::from_cents(5000),
                BudgetPeriod::Weekly,
                Utc::now(),
            ))
            .unwrap();
        storage
            .goals
            .upsert(Goal::new(
                alice.clone(),
                "Bike",
                Money::from_cents(80_000),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                "USD",
                Utc::now(),
            ))
            .unwrap();

        let mut output = Vec::new();
        export_owner_json(&storage, &alice, &mut output, true).unwrap();
        let json_str = String::from_utf8(output).unwrap();

        let export = import_from_json(&json_str).unwrap();
        assert_eq!(export.metadata.transaction_count, 2);
        assert_eq!(export.metadata.budget_count, 1);
        assert_eq!(export.metadata.goal_count, 1);
        assert_eq!(export.metadata.earliest_transaction.as_deref(), Some("2025-02-03"));
        assert_eq!(export.metadata.latest_transaction.as_deref(), Some("2025-02-09"));
    }

    #[test]
    fn test_validate_rejects_foreign_data_and_bad_version() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = Owner::new("alice").unwrap();
        let mut export = OwnerExport::from_storage(&storage, &alice).unwrap();
        assert!(export.validate().is_ok());

        export.budgets.push(Budget::new(
            Owner::new("mallory").unwrap(),
            "Food",
            Money::from_cents(100),
            BudgetPeriod::Monthly,
            Utc::now(),
        ));
        assert!(export.validate().unwrap_err().contains("mallory"));

        export.budgets.clear();
        export.schema_version = "0.1".into();
        assert!(export.validate().is_err());
    }
}
