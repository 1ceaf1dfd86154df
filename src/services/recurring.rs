//! Recurring transaction scheduling
//!
//! The job table lives in storage; each row is a [`RecurringSeries`] whose
//! state machine decides what fires. This service only drives due series
//! forward and persists the outcome. Timer delivery is external: something
//! (cron, an operator) calls [`RecurringService::run_due`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::clock::{Clock, SystemClock};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    FireOutcome, Owner, RecurrenceRule, RecurringSeries, SeriesId, SeriesState, Transaction,
    TransactionId,
};
use crate::storage::Storage;

/// Service driving the recurring job table
pub struct RecurringService<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
}

/// What one scheduler pass did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Transactions materialized, in firing order
    pub fired: Vec<(SeriesId, TransactionId)>,
    /// Series that reached a stop condition
    pub completed: Vec<SeriesId>,
    /// Series canceled because their template no longer validates
    pub canceled: Vec<(SeriesId, String)>,
    /// Series left unadvanced because persisting failed; retried next run
    pub failed: Vec<(SeriesId, String)>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
            && self.completed.is_empty()
            && self.canceled.is_empty()
            && self.failed.is_empty()
    }
}

impl<'a> RecurringService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self { storage, clock }
    }

    /// Start a series from a template transaction
    ///
    /// The template must itself be a valid transaction; the derived
    /// transactions will be validated again each time the series fires.
    pub fn start_series(
        &self,
        template: &Transaction,
        rule: &RecurrenceRule,
    ) -> FinanceResult<SeriesId> {
        rule.validate()
            .map_err(|e| FinanceError::Validation(format!("Invalid recurrence: {}", e)))?;
        let mut checked = template.clone();
        checked.recurrence = None;
        checked
            .validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;

        let series = RecurringSeries::start(template, rule, self.clock.now());
        let id = series.id;

        self.storage.series.upsert(series.clone())?;
        if let Err(e) = self.storage.series.save() {
            self.storage.series.delete(id)?;
            return Err(e);
        }

        if let Err(e) = self.storage.log_create(
            EntityType::RecurringSeries,
            id.to_string(),
            &series.owner,
            Some(format!("{} {}", series.template.category, rule)),
            &series,
        ) {
            warn!(series = %id, error = %e, "failed to audit series start");
        }

        info!(
            series = %id,
            template = %template.id,
            rule = %rule,
            state = %series.state,
            next = %series.next_trigger,
            "started recurring series"
        );
        Ok(id)
    }

    /// Cancel a series; cancelling a terminal series returns it unchanged
    pub fn cancel_series(&self, owner: &Owner, id: SeriesId) -> FinanceResult<RecurringSeries> {
        let mut series = self
            .storage
            .series
            .get(owner, id)?
            .ok_or_else(|| FinanceError::series_not_found(id.to_string()))?;

        let before = series.clone();
        if !series.cancel("Canceled by user", self.clock.now()) {
            return Ok(series);
        }

        self.storage.series.upsert(series.clone())?;
        if let Err(e) = self.storage.series.save() {
            self.storage.series.upsert(before)?;
            return Err(e);
        }
        self.storage.log_update(
            EntityType::RecurringSeries,
            id.to_string(),
            owner,
            Some(series.template.category.clone()),
            &before,
            &series,
            Some("state: scheduled -> canceled".to_string()),
        )?;

        warn!(series = %id, "recurring series canceled by user");
        Ok(series)
    }

    pub fn get_series(&self, owner: &Owner, id: SeriesId) -> FinanceResult<RecurringSeries> {
        self.storage
            .series
            .get(owner, id)?
            .ok_or_else(|| FinanceError::series_not_found(id.to_string()))
    }

    pub fn find_series(&self, owner: &Owner, reference: &str) -> FinanceResult<RecurringSeries> {
        self.storage
            .series
            .find(owner, reference)?
            .ok_or_else(|| FinanceError::series_not_found(reference))
    }

    pub fn list_series(&self, owner: &Owner) -> FinanceResult<Vec<RecurringSeries>> {
        self.storage.series.get_by_owner(owner)
    }

    /// Upcoming trigger times for a template and rule, without persisting
    pub fn preview(
        &self,
        template_at: DateTime<Utc>,
        rule: &RecurrenceRule,
        limit: usize,
    ) -> FinanceResult<Vec<DateTime<Utc>>> {
        rule.validate()
            .map_err(|e| FinanceError::Validation(format!("Invalid recurrence: {}", e)))?;
        Ok(rule.upcoming(template_at, limit))
    }

    /// Fire every due series of every owner
    pub fn run_due(&self, now: DateTime<Utc>) -> FinanceResult<RunReport> {
        let due = self.storage.series.get_due(now)?;
        Ok(self.run_series(due, now))
    }

    /// Fire the due series of one owner
    pub fn run_due_for(&self, owner: &Owner, now: DateTime<Utc>) -> FinanceResult<RunReport> {
        let due = self
            .storage
            .series
            .get_due(now)?
            .into_iter()
            .filter(|s| &s.owner == owner)
            .collect();
        Ok(self.run_series(due, now))
    }

    fn run_series(&self, due: Vec<RecurringSeries>, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::default();
        for series in due {
            self.drive(series, now, &mut report);
        }
        if !report.is_empty() {
            info!(
                fired = report.fired.len(),
                completed = report.completed.len(),
                canceled = report.canceled.len(),
                failed = report.failed.len(),
                "recurring run finished"
            );
        }
        report
    }

    /// Fire one series until its next trigger is in the future or it stops
    ///
    /// Each step is committed on its own: the derived transaction first, then
    /// the advanced series. A step that fails to persist leaves the series at
    /// its last committed trigger and the remaining steps for the next run.
    fn drive(&self, mut series: RecurringSeries, now: DateTime<Utc>, report: &mut RunReport) {
        let was_completed = series.state == SeriesState::Completed;

        while series.is_due(now) {
            let before = series.clone();
            let step = match series.fire(now) {
                FireOutcome::Fired(txn) => self.commit_derived(series.id, &txn).map(|created| {
                    if created {
                        report.fired.push((series.id, txn.id));
                    }
                }),
                FireOutcome::Canceled(reason) => {
                    warn!(series = %series.id, reason = %reason, "recurring series canceled");
                    report.canceled.push((series.id, reason));
                    Ok(())
                }
                FireOutcome::Completed | FireOutcome::Idle => Ok(()),
            };

            if let Err(e) = step.and_then(|()| self.commit_series(&before, &series)) {
                warn!(series = %series.id, error = %e, "recurring series left for the next run");
                report.failed.push((series.id, e.to_string()));
                return;
            }
        }

        if series.state == SeriesState::Completed && !was_completed {
            info!(series = %series.id, occurrences = series.occurrences, "recurring series completed");
            report.completed.push(series.id);
        }
    }

    /// Persist a derived transaction unless its trigger was already
    /// materialized; returns whether a new transaction was written
    ///
    /// A successful save is the commit point. Audit failures after it are
    /// logged and do not undo the transaction.
    fn commit_derived(&self, series: SeriesId, txn: &Transaction) -> FinanceResult<bool> {
        if let Some(existing) = self
            .storage
            .transactions
            .find_materialized(series, txn.occurred_at)?
        {
            debug!(series = %series, transaction = %existing.id, "trigger already materialized");
            return Ok(false);
        }

        self.storage.transactions.upsert(txn.clone())?;
        if let Err(e) = self.storage.transactions.save() {
            self.storage.transactions.delete(txn.id)?;
            return Err(e);
        }
        if let Err(e) = self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            &txn.owner,
            Some(format!("{} {}", txn.occurred_at.format("%Y-%m-%d"), txn.category)),
            txn,
        ) {
            warn!(transaction = %txn.id, error = %e, "failed to audit recurring transaction");
        }
        info!(transaction = %txn.id, at = %txn.occurred_at, "materialized recurring transaction");
        Ok(true)
    }

    /// Persist one advance of a series; on failure memory is put back to `before`
    fn commit_series(
        &self,
        before: &RecurringSeries,
        after: &RecurringSeries,
    ) -> FinanceResult<()> {
        self.storage.series.upsert(after.clone())?;
        if let Err(e) = self.storage.series.save() {
            self.storage.series.upsert(before.clone())?;
            return Err(e);
        }
        if let Err(e) = self.storage.log_update(
            EntityType::RecurringSeries,
            after.id.to_string(),
            &after.owner,
            Some(after.template.category.clone()),
            before,
            after,
            None,
        ) {
            warn!(series = %after.id, error = %e, "failed to audit series update");
        }
        Ok(())
    }
}
