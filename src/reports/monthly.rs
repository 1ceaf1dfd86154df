//! Monthly Totals Report
//!
//! Income and expense totals per calendar month (UTC), oldest month first.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::FinanceResult;
use crate::models::{Money, Owner, Transaction, TransactionKind};
use crate::storage::Storage;

/// Totals of one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: Money,
    pub expenses: Money,
}

impl MonthlyTotal {
    pub fn net(&self) -> Money {
        self.income - self.expenses
    }

    pub fn total(&self, kind: TransactionKind) -> Money {
        match kind {
            TransactionKind::Income => self.income,
            TransactionKind::Expense => self.expenses,
        }
    }
}

/// Monthly Totals Report
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub months: Vec<MonthlyTotal>,
}

impl MonthlyReport {
    pub fn generate(storage: &Storage, owner: &Owner) -> FinanceResult<Self> {
        let transactions = storage.transactions.get_by_owner(owner)?;
        Ok(Self::from_transactions(&transactions))
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        // "YYYY-MM" keys sort chronologically
        let mut months: BTreeMap<String, MonthlyTotal> = BTreeMap::new();
        for txn in transactions {
            let key = txn.occurred_at.format("%Y-%m").to_string();
            let entry = months.entry(key.clone()).or_insert_with(|| MonthlyTotal {
                month: key,
                income: Money::zero(),
                expenses: Money::zero(),
            });
            match txn.kind {
                TransactionKind::Income => entry.income += txn.amount,
                TransactionKind::Expense => entry.expenses += txn.amount,
            }
        }

        Self {
            months: months.into_values().collect(),
        }
    }

    pub fn format_terminal(&self) -> String {
        if self.months.is_empty() {
            return "No transactions found.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{:<8} {:>12} {:>12} {:>12}\n",
            "Month", "Income", "Expenses", "Net"
        ));
        output.push_str(&"-".repeat(47));
        output.push('\n');
        for month in &self.months {
            output.push_str(&format!(
                "{:<8} {:>12} {:>12} {:>12}\n",
                month.month,
                month.income,
                month.expenses,
                month.net()
            ));
        }
        output
    }
}
