//! Category Totals Report
//!
//! Net amount per category over an optional date range. Income counts
//! positive and expenses negative, so a category mixing both nets out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Money, Owner, Transaction};
use crate::storage::Storage;

/// Net total of one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Signed sum of the category's transactions
    pub total: Money,
    pub transaction_count: usize,
}

/// Category Totals Report
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotalsReport {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Sorted from largest outflow to largest inflow
    pub categories: Vec<CategoryTotal>,
    pub total_income: Money,
    pub total_expenses: Money,
}

impl CategoryTotalsReport {
    /// Generate the report for an owner, optionally limited to `[start, end]`
    pub fn generate(
        storage: &Storage,
        owner: &Owner,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> FinanceResult<Self> {
        let transactions = match range {
            Some((start, end)) => storage.transactions.get_by_date_range(owner, start, end)?,
            None => storage.transactions.get_by_owner(owner)?,
        };
        let mut report = Self::from_transactions(&transactions);
        if let Some((start, end)) = range {
            report.start = Some(start);
            report.end = Some(end);
        }
        Ok(report)
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut totals: BTreeMap<&str, (Money, usize)> = BTreeMap::new();
        let mut total_income = Money::zero();
        let mut total_expenses = Money::zero();

        for txn in transactions {
            let entry = totals.entry(txn.category.as_str()).or_insert((Money::zero(), 0));
            entry.0 += txn.signed_amount();
            entry.1 += 1;
            if txn.is_income() {
                total_income += txn.amount;
            } else {
                total_expenses += txn.amount;
            }
        }

        let mut categories: Vec<_> = totals
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category: category.to_string(),
                total,
                transaction_count: count,
            })
            .collect();
        categories.sort_by(|a, b| a.total.cmp(&b.total).then(a.category.cmp(&b.category)));

        Self {
            start: None,
            end: None,
            categories,
            total_income,
            total_expenses,
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        match (self.start, self.end) {
            (Some(start), Some(end)) => output.push_str(&format!(
                "Category Totals: {} to {}\n",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            )),
            _ => output.push_str("Category Totals: all time\n"),
        }
        output.push_str(&"=".repeat(50));
        output.push('\n');

        if self.categories.is_empty() {
            output.push_str("No transactions found.\n");
            return output;
        }

        output.push_str(&format!("{:<30} {:>12} {:>6}\n", "Category", "Net", "Count"));
        output.push_str(&"-".repeat(50));
        output.push('\n');
        for row in &self.categories {
            output.push_str(&format!(
                "{:<30} {:>12} {:>6}\n",
                truncate(&row.category, 30),
                row.total,
                row.transaction_count
            ));
        }
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!("{:<30} {:>12}\n", "Income", self.total_income));
        output.push_str(&format!("{:<30} {:>12}\n", "Expenses", self.total_expenses));

        output
    }

    /// Export the rows as CSV
    pub fn export_csv<W: Write>(&self, writer: W) -> FinanceResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["category", "total", "transaction_count"])
            .map_err(|e| FinanceError::Export(e.to_string()))?;
        for row in &self.categories {
            csv.write_record([
                row.category.clone(),
                row.total.to_string(),
                row.transaction_count.to_string(),
            ])
            .map_err(|e| FinanceError::Export(e.to_string()))?;
        }
        csv.flush()?;
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
