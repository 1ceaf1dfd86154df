//! Budget service
//!
//! Provides business logic for budget management: validated CRUD with a
//! uniqueness rule per (owner, category, period), plus progress, summary and
//! alert views computed by the period accounting engine.

use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::clock::{Clock, SystemClock};
use crate::error::{FinanceError, FinanceResult};
use crate::models::budget::validate_threshold;
use crate::models::{
    Budget, BudgetId, BudgetPeriod, BudgetStatus, ChangeSet, Money, Owner, Transaction,
};
use crate::services::accounting::{
    aggregate_across_budgets, check_alerts, compute_progress, AlertNotice, BudgetProgress,
    BudgetSummary,
};
use crate::storage::Storage;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
    week_start: Weekday,
}

/// Input for creating a budget
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    pub category: String,
    pub amount: Money,
    pub period: BudgetPeriod,
    pub alert_threshold: Option<f64>,
    pub description: Option<String>,
}

/// Partial update of a budget
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub period: Option<BudgetPeriod>,
    pub alert_threshold: Option<f64>,
    pub description: Option<String>,
}

/// All-time spending statistics for a budget's category
#[derive(Debug, Clone, Serialize)]
pub struct BudgetAnalytics {
    pub budget_id: BudgetId,
    pub category: String,
    pub transaction_count: usize,
    pub total_spent: Money,
    pub average_transaction: Money,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service with weeks starting on Sunday
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            clock: &SystemClock,
            week_start: Weekday::Sun,
        }
    }

    pub fn with_clock(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self {
            storage,
            clock,
            week_start: Weekday::Sun,
        }
    }

    /// Set the first day of weekly windows
    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    fn ensure_unique(&self, budget: &Budget) -> FinanceResult<()> {
        if let Some(existing) = self.storage.budgets.find_conflict(budget)? {
            return Err(FinanceError::Duplicate {
                entity_type: "Budget",
                identifier: format!("{} {} ({})", existing.category, existing.period, existing.id),
            });
        }
        Ok(())
    }

    fn expenses(&self, owner: &Owner) -> FinanceResult<Vec<Transaction>> {
        Ok(self
            .storage
            .transactions
            .get_by_owner(owner)?
            .into_iter()
            .filter(|t| t.is_expense())
            .collect())
    }

    /// Create a new budget
    pub fn create(&self, owner: &Owner, input: CreateBudgetInput) -> FinanceResult<Budget> {
        let mut budget = Budget::new(
            owner.clone(),
            input.category,
            input.amount,
            input.period,
            self.clock.now(),
        );
        if let Some(threshold) = input.alert_threshold {
            budget.alert_threshold = threshold;
        }
        budget.description = input.description.unwrap_or_default().trim().to_string();

        // Validate
        budget
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        self.ensure_unique(&budget)?;

        // Save
        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        // Audit
        self.storage.log_create(
            EntityType::Budget,
            budget.id.to_string(),
            owner,
            Some(format!("{} {}", budget.category, budget.period)),
            &budget,
        )?;

        info!(budget = %budget.id, category = %budget.category, period = %budget.period, "created budget");
        Ok(budget)
    }

    pub fn get(&self, owner: &Owner, id: BudgetId) -> FinanceResult<Budget> {
        self.storage
            .budgets
            .get(owner, id)?
            .ok_or_else(|| FinanceError::budget_not_found(id.to_string()))
    }

    /// Find a budget by full id, display form or id prefix
    pub fn find(&self, owner: &Owner, reference: &str) -> FinanceResult<Budget> {
        self.storage
            .budgets
            .find(owner, reference)?
            .ok_or_else(|| FinanceError::budget_not_found(reference))
    }

    /// List an owner's budgets, newest first
    pub fn list(&self, owner: &Owner) -> FinanceResult<Vec<Budget>> {
        self.storage.budgets.get_by_owner(owner)
    }

    /// Apply a partial update
    pub fn update(&self, owner: &Owner, id: BudgetId, patch: BudgetPatch) -> FinanceResult<Budget> {
        let mut budget = self.get(owner, id)?;
        let before = budget.clone();
        let mut changes = ChangeSet::new();

        if let Some(category) = patch.category {
            let category = category.trim().to_string();
            changes.track("category", &budget.category, &category);
            budget.category = category;
        }
        if let Some(amount) = patch.amount {
            changes.track("amount", &budget.amount, &amount);
            budget.amount = amount;
        }
        if let Some(period) = patch.period {
            changes.track("period", &budget.period, &period);
            budget.period = period;
        }
        if let Some(threshold) = patch.alert_threshold {
            validate_threshold(threshold).map_err(|e| FinanceError::Validation(e.to_string()))?;
            changes.track("alert_threshold", &budget.alert_threshold, &threshold);
            budget.alert_threshold = threshold;
        }
        if let Some(description) = patch.description {
            let description = description.trim().to_string();
            changes.track("description", &budget.description, &description);
            budget.description = description;
        }

        budget
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        self.ensure_unique(&budget)?;

        let Some(record) = changes.into_record(self.clock.now()) else {
            return Ok(budget);
        };
        let summary = record.summary();
        budget.record_edit(record);

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_update(
            EntityType::Budget,
            budget.id.to_string(),
            owner,
            Some(format!("{} {}", budget.category, budget.period)),
            &before,
            &budget,
            Some(summary.clone()),
        )?;

        info!(budget = %budget.id, changes = %summary, "updated budget");
        Ok(budget)
    }

    /// Move a budget between active, paused and archived
    pub fn set_status(
        &self,
        owner: &Owner,
        id: BudgetId,
        status: BudgetStatus,
    ) -> FinanceResult<Budget> {
        let mut budget = self.get(owner, id)?;
        if budget.status == status {
            return Ok(budget);
        }

        let before = budget.clone();
        let mut changes = ChangeSet::new();
        changes.track("status", &budget.status, &status);
        budget.status = status;
        if let Some(record) = changes.into_record(self.clock.now()) {
            budget.record_edit(record);
        }

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        self.storage.log_update(
            EntityType::Budget,
            budget.id.to_string(),
            owner,
            Some(format!("{} {}", budget.category, budget.period)),
            &before,
            &budget,
            Some(format!("status: {} -> {}", before.status, budget.status)),
        )?;

        info!(budget = %budget.id, status = %budget.status, "changed budget status");
        Ok(budget)
    }

    pub fn delete(&self, owner: &Owner, id: BudgetId) -> FinanceResult<Budget> {
        let budget = self.get(owner, id)?;

        self.storage.budgets.delete(id)?;
        self.storage.budgets.save()?;

        self.storage.log_delete(
            EntityType::Budget,
            id.to_string(),
            owner,
            Some(format!("{} {}", budget.category, budget.period)),
            &budget,
        )?;

        info!(budget = %id, "deleted budget");
        Ok(budget)
    }

    /// Spending progress of one budget in its current window
    pub fn progress(&self, owner: &Owner, id: BudgetId) -> FinanceResult<BudgetProgress> {
        let budget = self.get(owner, id)?;
        let expenses = self.expenses(owner)?;
        Ok(compute_progress(
            &budget,
            &expenses,
            self.clock.now(),
            self.week_start,
        ))
    }

    /// Progress of every active budget
    pub fn progress_all(&self, owner: &Owner) -> FinanceResult<Vec<BudgetProgress>> {
        let expenses = self.expenses(owner)?;
        let now = self.clock.now();
        Ok(self
            .active_budgets(owner)?
            .iter()
            .map(|b| compute_progress(b, &expenses, now, self.week_start))
            .collect())
    }

    pub fn active_budgets(&self, owner: &Owner) -> FinanceResult<Vec<Budget>> {
        Ok(self
            .list(owner)?
            .into_iter()
            .filter(|b| b.is_active())
            .collect())
    }

    /// Totals and health score across the owner's active budgets
    pub fn summary(&self, owner: &Owner) -> FinanceResult<BudgetSummary> {
        let budgets = self.active_budgets(owner)?;
        let expenses = self.expenses(owner)?;
        Ok(aggregate_across_budgets(
            &budgets,
            &expenses,
            self.clock.now(),
            self.week_start,
        ))
    }

    /// Active budgets at or past their alert threshold
    pub fn alerts(&self, owner: &Owner) -> FinanceResult<Vec<AlertNotice>> {
        let budgets = self.active_budgets(owner)?;
        let expenses = self.expenses(owner)?;
        let alerts = check_alerts(&budgets, &expenses, self.clock.now(), self.week_start);
        for alert in &alerts {
            warn!(budget = %alert.budget_id, severity = %alert.severity, "{}", alert.message);
        }
        Ok(alerts)
    }

    /// All-time expense statistics for the budget's category
    pub fn analytics(&self, owner: &Owner, id: BudgetId) -> FinanceResult<BudgetAnalytics> {
        let budget = self.get(owner, id)?;
        let matching: Vec<_> = self
            .expenses(owner)?
            .into_iter()
            .filter(|t| t.category == budget.category && t.amount.is_positive())
            .collect();

        let total_spent: Money = matching.iter().map(|t| t.amount).sum();
        let average_transaction = if matching.is_empty() {
            Money::zero()
        } else {
            Money::from_cents(total_spent.cents() / matching.len() as i64)
        };

        Ok(BudgetAnalytics {
            budget_id: budget.id,
            category: budget.category,
            transaction_count: matching.len(),
            total_spent,
            average_transaction,
            last_transaction_at: matching.iter().map(|t| t.occurred_at).max(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::paths::FinTrackPaths;
    use crate::models::TransactionKind;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = FinTrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    fn alice() -> Owner {
        Owner::new("alice").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn food(amount: i64) -> CreateBudgetInput {
        CreateBudgetInput {
            category: "Food".into(),
            amount: Money::from_cents(amount),
            period: BudgetPeriod::Monthly,
            alert_threshold: Some(0.8),
            description: None,
        }
    }

    fn spend(storage: &Storage, category: &str, cents: i64, day: u32) {
        let txn = Transaction::new(
            alice(),
            TransactionKind::Expense,
            category,
            Money::from_cents(cents),
            "USD",
            Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
            Utc::now(),
        );
        storage.transactions.upsert(txn).unwrap();
    }

    #[test]
    fn test_create_and_duplicate() {
        let (_dir, storage) = setup();
        let clock = FixedClock(now());
        let service = BudgetService::with_clock(&storage, &clock);

        let budget = service.create(&alice(), food(20_000)).unwrap();
        assert!(budget.is_active());
        assert_eq!(budget.created_at, now());

        let err = service.create(&alice(), food(30_000)).unwrap_err();
        assert!(err.is_duplicate());

        let mut weekly = food(5_000);
        weekly.period = BudgetPeriod::Weekly;
        service.create(&alice(), weekly).unwrap();

        let bob = Owner::new("bob").unwrap();
        service.create(&bob, food(20_000)).unwrap();
    }

    #[test]
    fn test_create_validation() {
        let (_dir, storage) = setup();
        let service = BudgetService::new(&storage);

        assert!(service.create(&alice(), food(0)).unwrap_err().is_validation());
        let mut bad = food(100);
        bad.alert_threshold = Some(1.5);
        assert!(service.create(&alice(), bad).unwrap_err().is_validation());
    }

    #[test]
    fn test_progress_scenario() {
        let (_dir, storage) = setup();
        let clock = FixedClock(now());
        let service = BudgetService::with_clock(&storage, &clock);
        let budget = service.create(&alice(), food(20_000)).unwrap();

        spend(&storage, "Food", 15_000, 10);
        spend(&storage, "Food", 9_999, 1);
        spend(&storage, "Transport", 4_000, 11);
        // previous month
        storage
            .transactions
            .upsert(Transaction::new(
                alice(),
                TransactionKind::Expense,
                "Food",
                Money::from_cents(7_000),
                "USD",
                Utc.with_ymd_and_hms(2025, 2, 27, 9, 0, 0).unwrap(),
                Utc::now(),
            ))
            .unwrap();

        let progress = service.progress(&alice(), budget.id).unwrap();
        assert_eq!(progress.spent.cents(), 24_999);
        assert!(progress.is_over_budget);

        let analytics = service.analytics(&alice(), budget.id).unwrap();
        assert_eq!(analytics.transaction_count, 3);
        assert_eq!(analytics.total_spent.cents(), 31_999);
        assert_eq!(analytics.average_transaction.cents(), 10_666);
        assert_eq!(
            analytics.last_transaction_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_summary_and_alerts_skip_inactive() {
        let (_dir, storage) = setup();
        let clock = FixedClock(now());
        let service = BudgetService::with_clock(&storage, &clock);

        let food_budget = service.create(&alice(), food(10_000)).unwrap();
        let mut fun = food(10_000);
        fun.category = "Fun".into();
        let fun_budget = service.create(&alice(), fun).unwrap();

        spend(&storage, "Food", 12_000, 5);
        spend(&storage, "Fun", 8_500, 5);

        let summary = service.summary(&alice()).unwrap();
        assert_eq!(summary.budget_count, 2);
        assert_eq!(summary.over_budget_count, 1);
        assert!((summary.health_score - 50.0).abs() < 1e-9);
        assert_eq!(service.alerts(&alice()).unwrap().len(), 2);

        service
            .set_status(&alice(), food_budget.id, BudgetStatus::Paused)
            .unwrap();
        let summary = service.summary(&alice()).unwrap();
        assert_eq!(summary.budget_count, 1);
        assert!((summary.health_score - 100.0).abs() < 1e-9);

        let alerts = service.alerts(&alice()).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].budget_id, fun_budget.id);
    }

    #[test]
    fn test_update_records_history_and_checks_conflicts() {
        let (_dir, storage) = setup();
        let service = BudgetService::new(&storage);
        let first = service.create(&alice(), food(10_000)).unwrap();
        let mut rent = food(100_000);
        rent.category = "Rent".into();
        let second = service.create(&alice(), rent).unwrap();

        let patch = BudgetPatch {
            amount: Some(Money::from_cents(12_500)),
            alert_threshold: Some(0.9),
            ..Default::default()
        };
        let updated = service.update(&alice(), first.id, patch).unwrap();
        assert_eq!(updated.amount.cents(), 12_500);
        assert_eq!(updated.history.len(), 1);

        let clash = BudgetPatch {
            category: Some("Food".into()),
            ..Default::default()
        };
        assert!(service
            .update(&alice(), second.id, clash)
            .unwrap_err()
            .is_duplicate());

        let bad = BudgetPatch {
            alert_threshold: Some(0.0),
            ..Default::default()
        };
        assert!(service.update(&alice(), first.id, bad).unwrap_err().is_validation());
    }

    #[test]
    fn test_delete_is_owner_scoped() {
        let (_dir, storage) = setup();
        let service = BudgetService::new(&storage);
        let budget = service.create(&alice(), food(10_000)).unwrap();

        let bob = Owner::new("bob").unwrap();
        assert!(service.delete(&bob, budget.id).unwrap_err().is_not_found());
        service.delete(&alice(), budget.id).unwrap();
        assert!(service.list(&alice()).unwrap().is_empty());
    }
}
