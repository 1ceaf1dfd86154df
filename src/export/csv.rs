//! CSV Export functionality
//!
//! Exports transactions, budgets and goals to spreadsheet-friendly CSV.

use std::io::Write;

use crate::error::{FinanceError, FinanceResult};
use crate::models::Owner;
use crate::storage::Storage;

fn export_err(e: csv::Error) -> FinanceError {
    FinanceError::Export(e.to_string())
}

/// Export an owner's transactions to CSV, oldest first
pub fn export_transactions_csv<W: Write>(
    storage: &Storage,
    owner: &Owner,
    writer: W,
) -> FinanceResult<()> {
    let mut transactions = storage.transactions.get_by_owner(owner)?;
    transactions.reverse();

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "date",
        "kind",
        "category",
        "amount",
        "currency",
        "description",
        "tags",
        "recurrence",
        "goal_id",
        "tax",
    ])
    .map_err(export_err)?;

    for txn in transactions {
        csv.write_record([
            txn.id.to_string(),
            txn.occurred_at.to_rfc3339(),
            txn.kind.to_string(),
            txn.category.clone(),
            txn.amount.to_string(),
            txn.currency.clone(),
            txn.description.clone(),
            txn.tags.iter().cloned().collect::<Vec<_>>().join(";"),
            txn.recurrence.as_ref().map(|r| r.to_string()).unwrap_or_default(),
            txn.goal_id.map(|g| g.to_string()).unwrap_or_default(),
            txn.tax.to_string(),
        ])
        .map_err(export_err)?;
    }

    csv.flush()?;
    Ok(())
}

/// Export an owner's budgets to CSV
pub fn export_budgets_csv<W: Write>(
    storage: &Storage,
    owner: &Owner,
    writer: W,
) -> FinanceResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "category",
        "amount",
        "period",
        "alert_threshold",
        "status",
        "description",
    ])
    .map_err(export_err)?;

    for budget in storage.budgets.get_by_owner(owner)? {
        csv.write_record([
            budget.id.to_string(),
            budget.category.clone(),
            budget.amount.to_string(),
            budget.period.to_string(),
            format!("{:.2}", budget.alert_threshold),
            budget.status.to_string(),
            budget.description.clone(),
        ])
        .map_err(export_err)?;
    }

    csv.flush()?;
    Ok(())
}

/// Export an owner's goals to CSV
pub fn export_goals_csv<W: Write>(
    storage: &Storage,
    owner: &Owner,
    writer: W,
) -> FinanceResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "id",
        "name",
        "target_amount",
        "current_amount",
        "currency",
        "deadline",
        "milestones",
        "is_completed",
    ])
    .map_err(export_err)?;

    for goal in storage.goals.get_by_owner(owner)? {
        csv.write_record([
            goal.id.to_string(),
            goal.name.clone(),
            goal.target_amount.to_string(),
            goal.current_amount.to_string(),
            goal.currency.clone(),
            goal.deadline.to_string(),
            goal.milestones.len().to_string(),
            goal.is_completed.to_string(),
        ])
        .map_err(export_err)?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::FinTrackPaths;
    use crate::models::{Money, Transaction, TransactionKind};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_transactions_csv_quotes_and_orders() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinTrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let alice = Owner::new("alice").unwrap();

        let mut late = Transaction::new(
            alice.clone(),
            TransactionKind::Expense,
            "Food",
            Money::from_cents(4250),
            "USD",
            Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
            Utc::now(),
        );
        late.description = "Dinner, with \"friends\"".into();
        late.tags.insert("social".into());
        late.tags.insert("dining".into());
        storage.transactions.upsert(late).unwrap();
        storage
            .transactions
            .upsert(Transaction::new(
                alice.clone(),
                TransactionKind::Income,
                "Salary",
                Money::from_cents(300_000),
                "USD",
                Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                Utc::now(),
            ))
            .unwrap();

        let mut output = Vec::new();
        export_transactions_csv(&storage, &alice, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,date,kind,category,amount"));
        assert!(lines[1].contains("Salary"));
        assert!(lines[2].contains("\"Dinner, with \"\"friends\"\"\""));
        assert!(lines[2].contains("dining;social"));
    }

    #[test]
    fn test_empty_exports_have_headers() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinTrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let alice = Owner::new("alice").unwrap();

        let mut budgets = Vec::new();
        export_budgets_csv(&storage, &alice, &mut budgets).unwrap();
        assert_eq!(
            String::from_utf8(budgets).unwrap(),
            "id,category,amount,period,alert_threshold,status,description\n"
        );

        let mut goals = Vec::new();
        export_goals_csv(&storage, &alice, &mut goals).unwrap();
        assert!(String::from_utf8(goals).unwrap().starts_with("id,name,"));
    }
}
