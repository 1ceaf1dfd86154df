//! Period accounting engine
//!
//! Derives a budget's spend for its current period window from the raw
//! transaction history. Nothing computed here is persisted, and nothing here
//! fails: malformed entries are skipped and empty inputs give identity
//! results.

use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::models::{Budget, BudgetId, BudgetPeriod, Money, PeriodWindow, Transaction};

/// Alert level of a budget for the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlert {
    None,
    /// Spend reached the alert threshold
    Threshold,
    /// Spend exceeds the cap
    OverBudget,
}

impl BudgetAlert {
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for BudgetAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "ok"),
            Self::Threshold => write!(f, "alert"),
            Self::OverBudget => write!(f, "over budget"),
        }
    }
}

/// A budget's position inside its current window
#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget_id: BudgetId,
    pub category: String,
    pub period: BudgetPeriod,
    pub window: PeriodWindow,
    pub amount: Money,
    pub spent: Money,
    /// `max(0, amount - spent)`
    pub remaining: Money,
    /// `spent / amount`, or 0 when the amount is not positive
    pub progress: f64,
    pub is_over_budget: bool,
    pub alert: BudgetAlert,
    /// Number of transactions counted toward `spent`
    pub matched: usize,
    pub percentage_used: f64,
    pub days_in_period: u32,
    pub days_elapsed: u32,
    /// Spend per elapsed day
    pub daily_average: Money,
}

/// Totals across a set of budgets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budget_count: usize,
    pub total_budget: Money,
    pub total_spent: Money,
    pub total_remaining: Money,
    /// `total_spent / total_budget`, or 0 without a positive total
    pub overall_progress: f64,
    /// Budgets at or past their alert threshold
    pub alert_count: usize,
    pub over_budget_count: usize,
    /// 0-100, 100 when there are no budgets
    pub health_score: f64,
}

/// Severity of an alert notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A surfaced (never stored) budget alert
#[derive(Debug, Clone, Serialize)]
pub struct AlertNotice {
    pub budget_id: BudgetId,
    pub category: String,
    pub amount: Money,
    pub spent: Money,
    pub progress: f64,
    pub alert_threshold: f64,
    pub severity: AlertSeverity,
    pub message: String,
}

fn is_well_formed(txn: &Transaction) -> bool {
    !txn.category.trim().is_empty() && txn.amount.is_positive()
}

/// Compute a budget's progress in the current window of its own period
pub fn compute_progress(
    budget: &Budget,
    transactions: &[Transaction],
    now: DateTime<Utc>,
    week_start: Weekday,
) -> BudgetProgress {
    let period = budget.period;
    let window = period.current_window(now, week_start);

    let mut spent = Money::zero();
    let mut matched = 0;
    let mut skipped = 0;
    for txn in transactions {
        if txn.owner != budget.owner || !txn.is_expense() {
            continue;
        }
        if !is_well_formed(txn) {
            skipped += 1;
            continue;
        }
        if txn.category == budget.category && window.contains(txn.occurred_at) {
            spent += txn.amount;
            matched += 1;
        }
    }
    if skipped > 0 {
        debug!(budget = %budget.id, skipped, "skipped malformed transactions");
    }

    let progress = spent.ratio_of(budget.amount);
    let is_over_budget = spent > budget.amount;
    let alert = if is_over_budget {
        BudgetAlert::OverBudget
    } else if budget.amount.is_positive() && progress >= budget.alert_threshold {
        BudgetAlert::Threshold
    } else {
        BudgetAlert::None
    };

    let today = now.date_naive();
    let days_elapsed = period.days_elapsed(today, week_start).max(1);
    let daily_average = Money::from_cents(spent.cents() / days_elapsed as i64);

    debug!(
        budget = %budget.id,
        window = %window,
        spent = %spent,
        matched,
        "computed budget progress"
    );

    BudgetProgress {
        budget_id: budget.id,
        category: budget.category.clone(),
        period,
        window,
        amount: budget.amount,
        spent,
        remaining: (budget.amount - spent).max_zero(),
        progress,
        is_over_budget,
        alert,
        matched,
        percentage_used: progress * 100.0,
        days_in_period: period.days_in_period(today),
        days_elapsed,
        daily_average,
    }
}

/// Aggregate progress across budgets
pub fn aggregate_across_budgets(
    budgets: &[Budget],
    transactions: &[Transaction],
    now: DateTime<Utc>,
    week_start: Weekday,
) -> BudgetSummary {
    let mut total_budget = Money::zero();
    let mut total_spent = Money::zero();
    let mut alert_count = 0;
    let mut over_budget_count = 0;

    for budget in budgets {
        let progress = compute_progress(budget, transactions, now, week_start);
        total_budget += budget.amount;
        total_spent += progress.spent;
        if budget.amount.is_positive() && progress.progress >= budget.alert_threshold {
            alert_count += 1;
        }
        if progress.is_over_budget {
            over_budget_count += 1;
        }
    }

    let health_score = if budgets.is_empty() {
        100.0
    } else {
        (100.0 - over_budget_count as f64 / budgets.len() as f64 * 100.0).max(0.0)
    };

    BudgetSummary {
        budget_count: budgets.len(),
        total_budget,
        total_spent,
        total_remaining: (total_budget - total_spent).max_zero(),
        overall_progress: total_spent.ratio_of(total_budget),
        alert_count,
        over_budget_count,
        health_score,
    }
}

/// Every budget that is at or past its alert threshold
pub fn check_alerts(
    budgets: &[Budget],
    transactions: &[Transaction],
    now: DateTime<Utc>,
    week_start: Weekday,
) -> Vec<AlertNotice> {
    budgets
        .iter()
        .filter_map(|budget| {
            let progress = compute_progress(budget, transactions, now, week_start);
            let (severity, message) = match progress.alert {
                BudgetAlert::None => return None,
                BudgetAlert::OverBudget => (
                    AlertSeverity::High,
                    format!("You're over budget on {}!", budget.category),
                ),
                BudgetAlert::Threshold => (
                    AlertSeverity::Medium,
                    format!(
                        "You've reached {:.0}% of your {} budget.",
                        progress.percentage_used, budget.category
                    ),
                ),
            };
            Some(AlertNotice {
                budget_id: budget.id,
                category: budget.category.clone(),
                amount: budget.amount,
                spent: progress.spent,
                progress: progress.progress,
                alert_threshold: budget.alert_threshold,
                severity,
                message,
            })
        })
        .collect()
}
