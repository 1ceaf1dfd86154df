//! Spending Recommendations
//!
//! For every active budget whose spend in the current window has passed 90%
//! of its cap, suggests trimming that spend by 10%.

use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;

use crate::error::FinanceResult;
use crate::models::{Budget, BudgetId, Money, Owner, Transaction};
use crate::services::accounting::compute_progress;
use crate::storage::Storage;

/// Fraction of the cap above which a recommendation is made
pub const RECOMMENDATION_THRESHOLD: f64 = 0.9;

/// Suggested cut as a fraction of current spend
pub const SUGGESTED_REDUCTION: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub budget_id: BudgetId,
    pub category: String,
    pub spent: Money,
    pub amount: Money,
    pub message: String,
    /// What the suggested reduction would save this period
    pub savings: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationReport {
    pub fn generate(
        storage: &Storage,
        owner: &Owner,
        now: DateTime<Utc>,
        week_start: Weekday,
    ) -> FinanceResult<Self> {
        let budgets: Vec<_> = storage
            .budgets
            .get_by_owner(owner)?
            .into_iter()
            .filter(|b| b.is_active())
            .collect();
        let transactions = storage.transactions.get_by_owner(owner)?;
        Ok(Self::from_parts(&budgets, &transactions, now, week_start))
    }

    pub fn from_parts(
        budgets: &[Budget],
        transactions: &[Transaction],
        now: DateTime<Utc>,
        week_start: Weekday,
    ) -> Self {
        let recommendations = budgets
            .iter()
            .filter_map(|budget| {
                let progress = compute_progress(budget, transactions, now, week_start);
                if progress.spent <= budget.amount.scale(RECOMMENDATION_THRESHOLD) {
                    return None;
                }
                Some(Recommendation {
                    budget_id: budget.id,
                    category: budget.category.clone(),
                    spent: progress.spent,
                    amount: budget.amount,
                    message: format!(
                        "Reduce spending on {} by 10% to stay within budget.",
                        budget.category
                    ),
                    savings: progress.spent.scale(SUGGESTED_REDUCTION),
                })
            })
            .collect();

        Self { recommendations }
    }

    pub fn format_terminal(&self) -> String {
        if self.recommendations.is_empty() {
            return "No recommendations: every budget is below 90% of its cap.\n".to_string();
        }

        let mut output = String::new();
        for rec in &self.recommendations {
            output.push_str(&format!(
                "- {} (spent {} of {}, save about {})\n",
                rec.message, rec.spent, rec.amount, rec.savings
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, TransactionKind};
    use chrono::TimeZone;

    fn alice() -> Owner {
        Owner::new("alice").unwrap()
    }

    fn expense(category: &str, cents: i64) -> Transaction {
        Transaction::new(
            alice(),
            TransactionKind::Expense,
            category,
            Money::from_cents(cents),
            "USD",
            Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_recommends_above_ninety_percent() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        let monthly = |category: &str| {
            Budget::new(alice(), category, Money::from_cents(10_000), BudgetPeriod::Monthly, now)
        };
        let (food, fuel) = (monthly("Food"), monthly("Fuel"));
        let txns = vec![expense("Food", 9_500), expense("Fuel", 9_000)];

        let report = RecommendationReport::from_parts(&[food, fuel], &txns, now, Weekday::Sun);
        assert_eq!(report.recommendations.len(), 1);
        let rec = &report.recommendations[0];
        assert_eq!(rec.category, "Food");
        assert_eq!(rec.savings.cents(), 950);
        assert!(rec.message.contains("Reduce spending on Food by 10%"));
    }
}
