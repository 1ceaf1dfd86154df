//! Transaction service
//!
//! Provides business logic for transaction management: validated CRUD with
//! edit history, starting a recurring series when a transaction carries
//! recurrence metadata, and teaching the category predictor.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::clock::{Clock, SystemClock};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    normalize_currency, ChangeSet, GoalId, Money, Owner, RecurrenceRule, Transaction,
    TransactionId, TransactionKind,
};
use crate::services::{PredictionService, RecurringService};
use crate::storage::Storage;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn date_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind.map_or(true, |k| txn.kind == k)
            && self
                .category
                .as_deref()
                .map_or(true, |c| txn.category.eq_ignore_ascii_case(c.trim()))
            && self.start.map_or(true, |s| txn.occurred_at >= s)
            && self.end.map_or(true, |e| txn.occurred_at <= e)
            && self.tag.as_deref().map_or(true, |t| txn.has_tag(t))
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Money,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub recurrence: Option<RecurrenceRule>,
    pub goal: Option<GoalId>,
    pub tax: Option<Money>,
}

/// Partial update of a transaction; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// Replaces the whole tag set
    pub tags: Option<Vec<String>>,
    /// `Some(None)` unlinks the goal
    pub goal: Option<Option<GoalId>>,
    pub tax: Option<Money>,
}

fn clean_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn option_label<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self { storage, clock }
    }

    fn ensure_goal(&self, owner: &Owner, goal: Option<GoalId>) -> FinanceResult<()> {
        if let Some(goal_id) = goal {
            self.storage
                .goals
                .get(owner, goal_id)?
                .ok_or_else(|| FinanceError::goal_not_found(goal_id.to_string()))?;
        }
        Ok(())
    }

    fn currency(code: &str) -> FinanceResult<String> {
        normalize_currency(code).ok_or_else(|| {
            FinanceError::Validation(format!("Invalid currency code '{}': expected e.g. USD", code))
        })
    }

    /// Create a new transaction
    ///
    /// A transaction with recurrence metadata also starts a recurring series
    /// whose first trigger is one cadence unit after `occurred_at`.
    pub fn create(&self, owner: &Owner, input: CreateTransactionInput) -> FinanceResult<Transaction> {
        self.ensure_goal(owner, input.goal)?;

        let mut txn = Transaction::new(
            owner.clone(),
            input.kind,
            input.category,
            input.amount,
            Self::currency(&input.currency)?,
            input.occurred_at,
            self.clock.now(),
        );
        txn.description = input.description.unwrap_or_default().trim().to_string();
        txn.tags = clean_tags(input.tags);
        txn.recurrence = input.recurrence;
        txn.goal_id = input.goal;
        txn.tax = input.tax.unwrap_or_default();

        txn.validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        if let Some(rule) = &txn.recurrence {
            let recurring = RecurringService::with_clock(self.storage, self.clock);
            if let Err(e) = recurring.start_series(&txn, rule) {
                self.discard(&txn)?;
                return Err(e);
            }
        }

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            owner,
            Some(format!("{} {}", txn.occurred_at.format("%Y-%m-%d"), txn.category)),
            &txn,
        )?;
        info!(transaction = %txn.id, kind = %txn.kind, amount = %txn.amount, "created transaction");

        if !txn.description.is_empty() {
            PredictionService::new(self.storage).learn(owner, &txn.description, &txn.category)?;
        }

        Ok(txn)
    }

    /// Take back a just-saved transaction whose series could not be started
    fn discard(&self, txn: &Transaction) -> FinanceResult<()> {
        self.storage.transactions.delete(txn.id)?;
        if let Err(e) = self.storage.transactions.save() {
            warn!(transaction = %txn.id, error = %e, "failed to remove transaction without series");
        }
        Ok(())
    }

    pub fn get(&self, owner: &Owner, id: TransactionId) -> FinanceResult<Transaction> {
        self.storage
            .transactions
            .get(owner, id)?
            .ok_or_else(|| FinanceError::transaction_not_found(id.to_string()))
    }

    /// Find a transaction by full id, display form or id prefix
    pub fn find(&self, owner: &Owner, reference: &str) -> FinanceResult<Transaction> {
        self.storage
            .transactions
            .find(owner, reference)?
            .ok_or_else(|| FinanceError::transaction_not_found(reference))
    }

    /// List an owner's transactions, newest first
    pub fn list(&self, owner: &Owner, filter: &TransactionFilter) -> FinanceResult<Vec<Transaction>> {
        let mut txns: Vec<_> = self
            .storage
            .transactions
            .get_by_owner(owner)?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        if let Some(limit) = filter.limit {
            txns.truncate(limit);
        }
        Ok(txns)
    }

    /// All transactions of an owner, unfiltered
    pub fn all(&self, owner: &Owner) -> FinanceResult<Vec<Transaction>> {
        self.storage.transactions.get_by_owner(owner)
    }

    /// Apply a partial update and append it to the edit history
    pub fn update(
        &self,
        owner: &Owner,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> FinanceResult<Transaction> {
        let mut txn = self.get(owner, id)?;
        let before = txn.clone();
        let mut changes = ChangeSet::new();

        if let Some(kind) = patch.kind {
            changes.track("kind", &txn.kind, &kind);
            txn.kind = kind;
        }
        if let Some(category) = patch.category {
            let category = category.trim().to_string();
            changes.track("category", &txn.category, &category);
            txn.category = category;
        }
        if let Some(amount) = patch.amount {
            changes.track("amount", &txn.amount, &amount);
            txn.amount = amount;
        }
        if let Some(currency) = patch.currency {
            let currency = Self::currency(&currency)?;
            changes.track("currency", &txn.currency, &currency);
            txn.currency = currency;
        }
        if let Some(at) = patch.occurred_at {
            changes.track("occurred_at", &txn.occurred_at, &at);
            txn.occurred_at = at;
        }
        if let Some(description) = patch.description {
            let description = description.trim().to_string();
            changes.track("description", &txn.description, &description);
            txn.description = description;
        }
        if let Some(tags) = patch.tags {
            let tags = clean_tags(tags);
            let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(",");
            changes.track("tags", &join(&txn.tags), &join(&tags));
            txn.tags = tags;
        }
        if let Some(goal) = patch.goal {
            self.ensure_goal(owner, goal)?;
            changes.track("goal", &option_label(&txn.goal_id), &option_label(&goal));
            txn.goal_id = goal;
        }
        if let Some(tax) = patch.tax {
            changes.track("tax", &txn.tax, &tax);
            txn.tax = tax;
        }

        txn.validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        let Some(record) = changes.into_record(self.clock.now()) else {
            return Ok(txn);
        };
        let summary = record.summary();
        txn.record_edit(record);

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_update(
            EntityType::Transaction,
            txn.id.to_string(),
            owner,
            Some(format!("{} {}", txn.occurred_at.format("%Y-%m-%d"), txn.category)),
            &before,
            &txn,
            Some(summary.clone()),
        )?;
        info!(transaction = %txn.id, changes = %summary, "updated transaction");

        Ok(txn)
    }

    /// Hard-delete a transaction
    ///
    /// Series started from it keep running from their own template snapshot.
    pub fn delete(&self, owner: &Owner, id: TransactionId) -> FinanceResult<Transaction> {
        let txn = self.get(owner, id)?;

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;

        self.storage.log_delete(
            EntityType::Transaction,
            id.to_string(),
            owner,
            Some(format!("{} {}", txn.occurred_at.format("%Y-%m-%d"), txn.category)),
            &txn,
        )?;
        info!(transaction = %id, "deleted transaction");

        Ok(txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::paths::FinTrackPaths;
    use crate::models::{Frequency, Goal};
    use chrono::{NaiveDate, TimeZone};
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

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, d, 12, 0, 0).unwrap()
    }

    fn input(category: &str, cents: i64, day: u32) -> CreateTransactionInput {
        CreateTransactionInput {
            kind: TransactionKind::Expense,
            category: category.to_string(),
            amount: Money::from_cents(cents),
            currency: "usd".to_string(),
            occurred_at: at(day),
            description: None,
            tags: vec![],
            recurrence: None,
            goal: None,
            tax: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);

        let mut i = input("Food", 1250, 3);
        i.tags = vec!["lunch".into(), " ".into(), "lunch".into()];
        let txn = service.create(&alice(), i).unwrap();
        assert_eq!(txn.currency, "USD");
        assert_eq!(txn.tags.len(), 1);

        let fetched = service.get(&alice(), txn.id).unwrap();
        assert_eq!(fetched.amount.cents(), 1250);
        assert!(service
            .get(&Owner::new("bob").unwrap(), txn.id)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);

        assert!(service.create(&alice(), input("Food", 0, 3)).unwrap_err().is_validation());
        assert!(service.create(&alice(), input("  ", 100, 3)).unwrap_err().is_validation());

        let mut bad_currency = input("Food", 100, 3);
        bad_currency.currency = "dollars".into();
        assert!(service.create(&alice(), bad_currency).unwrap_err().is_validation());

        let mut missing_goal = input("Savings", 100, 3);
        missing_goal.goal = Some(GoalId::new());
        assert!(service.create(&alice(), missing_goal).unwrap_err().is_not_found());

        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_create_with_goal_link() {
        let (_dir, storage) = setup();
        let goal = Goal::new(
            alice(),
            "Trip",
            Money::from_cents(100_000),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            "USD",
            Utc::now(),
        );
        let goal_id = goal.id;
        storage.goals.upsert(goal).unwrap();

        let service = TransactionService::new(&storage);
        let mut i = input("Savings", 5000, 3);
        i.goal = Some(goal_id);
        let txn = service.create(&alice(), i).unwrap();
        assert_eq!(txn.goal_id, Some(goal_id));
    }

    #[test]
    fn test_recurring_create_starts_series() {
        let (_dir, storage) = setup();
        let clock = FixedClock(at(1));
        let service = TransactionService::with_clock(&storage, &clock);

        let mut i = input("Rent", 150_000, 1);
        i.recurrence = Some(RecurrenceRule {
            frequency: Frequency::Monthly,
            end_date: None,
            count: Some(12),
        });
        let txn = service.create(&alice(), i).unwrap();
        assert!(txn.is_recurring());

        let series = storage.series.get_by_owner(&alice()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].template_id, txn.id);
        assert_eq!(series[0].next_trigger, Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_recurring_create_fails_whole_when_series_unsaved() {
        let (dir, storage) = setup();
        let clock = FixedClock(at(1));
        let service = TransactionService::with_clock(&storage, &clock);
        let series_file = storage.paths().series_file();
        std::fs::create_dir(&series_file).unwrap();

        let mut i = input("Gym", 3_000, 1);
        i.recurrence = Some(RecurrenceRule {
            frequency: Frequency::Daily,
            end_date: None,
            count: Some(3),
        });
        assert!(matches!(
            service.create(&alice(), i).unwrap_err(),
            FinanceError::Storage(_)
        ));
        assert_eq!(storage.transactions.count().unwrap(), 0);
        assert!(storage.series.get_by_owner(&alice()).unwrap().is_empty());
        assert!(storage.audit().read_all().unwrap().is_empty());

        std::fs::remove_dir(&series_file).unwrap();
        let reopened =
            Storage::open(FinTrackPaths::with_base_dir(dir.path().to_path_buf())).unwrap();
        assert_eq!(reopened.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_created_at_follows_clock() {
        let (_dir, storage) = setup();
        let clock = FixedClock(at(9));
        let service = TransactionService::with_clock(&storage, &clock);

        let txn = service.create(&alice(), input("Food", 800, 2)).unwrap();
        assert_eq!(txn.occurred_at, at(2));
        assert_eq!(txn.created_at, at(9));
        assert_eq!(txn.updated_at, at(9));
    }

    #[test]
    fn test_create_teaches_predictor() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);
        let mut i = input("Entertainment", 1599, 3);
        i.description = Some("Netflix".into());
        service.create(&alice(), i).unwrap();

        let learned = storage.predictions.get(&alice(), "netflix").unwrap().unwrap();
        assert_eq!(learned.category, "Entertainment");
    }

    #[test]
    fn test_update_appends_history() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);
        let txn = service.create(&alice(), input("Food", 1000, 3)).unwrap();

        let patch = TransactionPatch {
            amount: Some(Money::from_cents(1500)),
            category: Some("Dining".into()),
            ..Default::default()
        };
        let updated = service.update(&alice(), txn.id, patch).unwrap();
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].changes.len(), 2);
        assert_eq!(updated.history[0].changes[0].from, "Food");

        // no-op patch leaves history alone
        let same = service
            .update(&alice(), txn.id, TransactionPatch::default())
            .unwrap();
        assert_eq!(same.history.len(), 1);

        let bad = TransactionPatch {
            amount: Some(Money::zero()),
            ..Default::default()
        };
        assert!(service.update(&alice(), txn.id, bad).unwrap_err().is_validation());
        assert_eq!(service.get(&alice(), txn.id).unwrap().amount.cents(), 1500);
    }

    #[test]
    fn test_list_filters_and_limit() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);
        service.create(&alice(), input("Food", 100, 1)).unwrap();
        service.create(&alice(), input("Food", 200, 5)).unwrap();
        let mut salary = input("Salary", 500_000, 2);
        salary.kind = TransactionKind::Income;
        salary.tags = vec!["work".into()];
        service.create(&alice(), salary).unwrap();

        let food = service
            .list(&alice(), &TransactionFilter::new().category("food"))
            .unwrap();
        assert_eq!(food.len(), 2);
        assert_eq!(food[0].amount.cents(), 200);

        let income = service
            .list(&alice(), &TransactionFilter::new().kind(TransactionKind::Income))
            .unwrap();
        assert_eq!(income.len(), 1);

        let tagged = service.list(&alice(), &TransactionFilter::new().tag("WORK")).unwrap();
        assert_eq!(tagged.len(), 1);

        let ranged = service
            .list(&alice(), &TransactionFilter::new().date_range(at(2), at(4)))
            .unwrap();
        assert_eq!(ranged.len(), 1);

        let limited = service.list(&alice(), &TransactionFilter::new().limit(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_delete() {
        let (_dir, storage) = setup();
        let service = TransactionService::new(&storage);
        let txn = service.create(&alice(), input("Food", 100, 1)).unwrap();

        let bob = Owner::new("bob").unwrap();
        assert!(service.delete(&bob, txn.id).unwrap_err().is_not_found());

        service.delete(&alice(), txn.id).unwrap();
        assert!(service.get(&alice(), txn.id).unwrap_err().is_not_found());
        let audit = storage.audit().read_all().unwrap();
        assert_eq!(audit.last().unwrap().operation, crate::audit::Operation::Delete);
    }
}
