//! Budget display formatting
//!
//! Formats budgets, their progress, the cross-budget summary and alerts.

use super::report::{format_bar, format_percentage};
use super::truncate;
use crate::models::Budget;
use crate::services::{AlertNotice, BudgetAnalytics, BudgetProgress, BudgetSummary};

/// Format a list of budgets with their current progress
pub fn format_budget_list(rows: &[(Budget, BudgetProgress)]) -> String {
    if rows.is_empty() {
        return "No budgets found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<14} {:<16} {:<8} {:>10} {:>10} {:>6}  {:<8} {}\n",
        "ID", "Category", "Period", "Amount", "Spent", "Used", "Status", "Alert"
    ));
    output.push_str(&"-".repeat(86));
    output.push('\n');

    for (budget, progress) in rows {
        output.push_str(&format!(
            "{:<14} {:<16} {:<8} {:>10} {:>10} {:>6}  {:<8} {}\n",
            budget.id.to_string(),
            truncate(&budget.category, 16),
            budget.period,
            budget.amount,
            progress.spent,
            format_percentage(progress.percentage_used),
            budget.status,
            progress.alert
        ));
    }

    output
}

/// Format one budget with its progress in the current window
pub fn format_budget_details(budget: &Budget, progress: &BudgetProgress) -> String {
    let mut output = String::new();

    output.push_str(&format!("Budget:      {}\n", budget.id));
    output.push_str(&format!("Category:    {}\n", budget.category));
    output.push_str(&format!("Period:      {} ({})\n", budget.period, progress.window));
    output.push_str(&format!("Status:      {}\n", budget.status));
    if !budget.description.is_empty() {
        output.push_str(&format!("Description: {}\n", budget.description));
    }
    output.push_str(&format!(
        "Threshold:   {}\n",
        format_percentage(budget.alert_threshold * 100.0)
    ));
    output.push('\n');
    output.push_str(&format!("Amount:      {:>12}\n", progress.amount));
    output.push_str(&format!("Spent:       {:>12}\n", progress.spent));
    output.push_str(&format!("Remaining:   {:>12}\n", progress.remaining));
    output.push_str(&format!(
        "Progress:    {} {}\n",
        format_bar(progress.progress.min(1.0), 1.0, 20),
        format_percentage(progress.percentage_used)
    ));
    output.push_str(&format!(
        "Day {} of {}, averaging {} per day\n",
        progress.days_elapsed, progress.days_in_period, progress.daily_average
    ));
    if progress.alert.is_alert() {
        output.push_str(&format!("Alert:       {}\n", progress.alert));
    }

    output
}

pub fn format_budget_summary(summary: &BudgetSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Active budgets: {}\n", summary.budget_count));
    output.push_str(&format!("Total budget:   {:>12}\n", summary.total_budget));
    output.push_str(&format!("Total spent:    {:>12}\n", summary.total_spent));
    output.push_str(&format!("Remaining:      {:>12}\n", summary.total_remaining));
    output.push_str(&format!(
        "Overall:        {}\n",
        format_percentage(summary.overall_progress * 100.0)
    ));
    output.push_str(&format!(
        "Alerts: {}  Over budget: {}\n",
        summary.alert_count, summary.over_budget_count
    ));
    output.push_str(&format!("Health score:   {:.0}/100\n", summary.health_score));
    output
}

pub fn format_alerts(alerts: &[AlertNotice]) -> String {
    if alerts.is_empty() {
        return "No budget alerts.\n".to_string();
    }

    alerts
        .iter()
        .map(|a| {
            format!(
                "[{}] {} ({} of {})\n",
                a.severity.to_string().to_uppercase(),
                a.message,
                a.spent,
                a.amount
            )
        })
        .collect()
}

pub fn format_budget_analytics(analytics: &BudgetAnalytics) -> String {
    let last = analytics
        .last_transaction_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "All-time {}: {} transactions, {} total, {} average, last {}\n",
        analytics.category,
        analytics.transaction_count,
        analytics.total_spent,
        analytics.average_transaction,
        last
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, Money, Owner};
    use crate::services::compute_progress;
    use chrono::{TimeZone, Utc, Weekday};

    #[test]
    fn test_budget_list_and_details() {
        let budget = Budget::new(
            Owner::new("alice").unwrap(),
            "Food",
            Money::from_cents(20_000),
            BudgetPeriod::Monthly,
            Utc::now(),
        );
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let progress = compute_progress(&budget, &[], now, Weekday::Sun);

        let list = format_budget_list(&[(budget.clone(), progress.clone())]);
        assert!(list.contains("Food"));
        assert!(list.contains("200.00"));

        let details = format_budget_details(&budget, &progress);
        assert!(details.contains("Remaining:"));
        assert!(!details.contains("Alert:"));
    }

    #[test]
    fn test_empty_views() {
        assert_eq!(format_budget_list(&[]), "No budgets found.\n");
        assert_eq!(format_alerts(&[]), "No budget alerts.\n");
    }
}
