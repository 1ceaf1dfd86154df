//! Financial Overview Report
//!
//! Income, expenses, net and savings rate over an optional date range.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FinanceResult;
use crate::models::{Money, Owner, Transaction};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub total_income: Money,
    pub total_expenses: Money,
    pub net: Money,
    /// `net / income` in percent; 0 without income
    pub savings_rate: f64,
    pub transaction_count: usize,
}

impl OverviewReport {
    pub fn generate(
        storage: &Storage,
        owner: &Owner,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> FinanceResult<Self> {
        let transactions = match range {
            Some((start, end)) => storage.transactions.get_by_date_range(owner, start, end)?,
            None => storage.transactions.get_by_owner(owner)?,
        };
        Ok(Self::from_transactions(&transactions))
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let total_income: Money = transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let total_expenses: Money = transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();
        let net = total_income - total_expenses;

        Self {
            total_income,
            total_expenses,
            net,
            savings_rate: net.ratio_of(total_income) * 100.0,
            transaction_count: transactions.len(),
        }
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();
        output.push_str("Financial Overview\n");
        output.push_str(&"=".repeat(30));
        output.push('\n');
        output.push_str(&format!("{:<16} {:>12}\n", "Income:", self.total_income));
        output.push_str(&format!("{:<16} {:>12}\n", "Expenses:", self.total_expenses));
        output.push_str(&format!("{:<16} {:>12}\n", "Net:", self.net));
        output.push_str(&format!("{:<16} {:>11.1}%\n", "Savings rate:", self.savings_rate));
        output.push_str(&format!("{:<16} {:>12}\n", "Transactions:", self.transaction_count));
        output
    }
}
