//! Transaction display formatting
//!
//! Provides utilities for formatting transactions for terminal display,
//! including the register view and the detail view with edit history.

use super::truncate;
use crate::models::{Transaction, TransactionKind};

/// Format a single transaction for display (register row)
pub fn format_transaction_row(txn: &Transaction) -> String {
    let recurring_indicator = if txn.is_recurring() { "↻" } else { " " };
    let amount = match txn.kind {
        TransactionKind::Income => format!("+{}", txn.amount),
        TransactionKind::Expense => format!("-{}", txn.amount),
    };

    format!(
        "{} {:<14} {} {:<16} {:>12} {:<3} {}",
        recurring_indicator,
        txn.id.to_string(),
        txn.occurred_at.format("%Y-%m-%d"),
        truncate(&txn.category, 16),
        amount,
        txn.currency,
        truncate(&txn.description, 30)
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<14} {:10} {:<16} {:>12} {:<3} {}\n",
        "ID", "Date", "Category", "Amount", "Cur", "Description"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn));
        output.push('\n');
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &Transaction) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!(
        "Date:        {}\n",
        txn.occurred_at.format("%Y-%m-%d %H:%M")
    ));
    output.push_str(&format!("Kind:        {}\n", txn.kind));
    output.push_str(&format!("Category:    {}\n", txn.category));
    output.push_str(&format!("Amount:      {} {}\n", txn.amount, txn.currency));

    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }
    if !txn.tags.is_empty() {
        let tags: Vec<_> = txn.tags.iter().map(String::as_str).collect();
        output.push_str(&format!("Tags:        {}\n", tags.join(", ")));
    }
    if txn.tax.is_positive() {
        output.push_str(&format!("Tax:         {}\n", txn.tax));
    }
    if let Some(goal) = txn.goal_id {
        output.push_str(&format!("Goal:        {}\n", goal));
    }
    if let Some(rule) = &txn.recurrence {
        output.push_str(&format!("Recurrence:  {}\n", rule));
    }

    if !txn.history.is_empty() {
        output.push_str("\nHistory:\n");
        for record in &txn.history {
            output.push_str(&format!(
                "  {} {}\n",
                record.edited_at.format("%Y-%m-%d %H:%M"),
                record.summary()
            ));
        }
    }

    output
}
