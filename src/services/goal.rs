//! Savings goal service
//!
//! Validated CRUD for goals, amount operations with milestone detection and
//! progress reporting.

use chrono::NaiveDate;
use tracing::info;

use crate::audit::EntityType;
use crate::clock::{Clock, SystemClock};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{
    normalize_currency, AmountOperation, ChangeSet, Goal, GoalId, GoalProgress, Milestone, Money,
    Owner,
};
use crate::storage::Storage;

/// Service for savings goal management
pub struct GoalService<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
}

/// Input for creating a goal
#[derive(Debug, Clone)]
pub struct CreateGoalInput {
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Option<Money>,
    pub deadline: NaiveDate,
    pub currency: String,
    pub milestones: Vec<Milestone>,
}

/// Partial update of a goal
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub deadline: Option<NaiveDate>,
    /// Replaces every milestone
    pub milestones: Option<Vec<Milestone>>,
}

/// Result of an amount operation
#[derive(Debug, Clone)]
pub struct AmountUpdate {
    pub goal: Goal,
    /// Milestones reached by this operation
    pub reached: Vec<Milestone>,
    /// True if this operation completed the goal
    pub completed_now: bool,
}

fn milestones_label(milestones: &[Milestone]) -> String {
    milestones
        .iter()
        .map(|m| format!("{}@{}", m.amount, m.date))
        .collect::<Vec<_>>()
        .join(",")
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self { storage, clock }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    fn ensure_unique(&self, goal: &Goal) -> FinanceResult<()> {
        if let Some(existing) = self.storage.goals.find_conflict(goal)? {
            return Err(FinanceError::Duplicate {
                entity_type: "Goal",
                identifier: format!("{} ({})", existing.name, existing.id),
            });
        }
        Ok(())
    }

    fn persist_update(
        &self,
        owner: &Owner,
        before: &Goal,
        goal: &Goal,
        summary: String,
    ) -> FinanceResult<()> {
        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;
        self.storage.log_update(
            EntityType::Goal,
            goal.id.to_string(),
            owner,
            Some(goal.name.clone()),
            before,
            goal,
            Some(summary),
        )
    }

    /// Create a new goal; the deadline must lie in the future
    pub fn create(&self, owner: &Owner, input: CreateGoalInput) -> FinanceResult<Goal> {
        let currency = normalize_currency(&input.currency).ok_or_else(|| {
            FinanceError::Validation(format!("Invalid currency code '{}'", input.currency))
        })?;

        let mut goal = Goal::new(
            owner.clone(),
            input.name,
            input.target_amount,
            input.deadline,
            currency,
            self.clock.now(),
        );
        goal.milestones = input.milestones;

        goal.validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        goal.validate_deadline(self.today())
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        self.ensure_unique(&goal)?;

        // A starting balance counts toward milestones like any deposit
        if let Some(current) = input.current_amount {
            if current.is_negative() {
                return Err(FinanceError::Validation(format!(
                    "Current amount cannot be negative (got {})",
                    current
                )));
            }
            goal.apply_amount(AmountOperation::Set, current, self.clock.now());
        }

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;

        self.storage.log_create(
            EntityType::Goal,
            goal.id.to_string(),
            owner,
            Some(goal.name.clone()),
            &goal,
        )?;

        info!(goal = %goal.id, name = %goal.name, target = %goal.target_amount, "created goal");
        Ok(goal)
    }

    pub fn get(&self, owner: &Owner, id: GoalId) -> FinanceResult<Goal> {
        self.storage
            .goals
            .get(owner, id)?
            .ok_or_else(|| FinanceError::goal_not_found(id.to_string()))
    }

    pub fn find(&self, owner: &Owner, reference: &str) -> FinanceResult<Goal> {
        self.storage
            .goals
            .find(owner, reference)?
            .ok_or_else(|| FinanceError::goal_not_found(reference))
    }

    /// List an owner's goals by deadline
    pub fn list(&self, owner: &Owner) -> FinanceResult<Vec<Goal>> {
        self.storage.goals.get_by_owner(owner)
    }

    /// Apply a partial update
    ///
    /// A changed deadline must again lie in the future; an unchanged one is
    /// allowed to have passed.
    pub fn update(&self, owner: &Owner, id: GoalId, patch: GoalPatch) -> FinanceResult<Goal> {
        let mut goal = self.get(owner, id)?;
        let before = goal.clone();
        let mut changes = ChangeSet::new();

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            changes.track("name", &goal.name, &name);
            goal.name = name;
        }
        if let Some(target) = patch.target_amount {
            changes.track("target_amount", &goal.target_amount, &target);
            goal.target_amount = target;
        }
        if let Some(deadline) = patch.deadline {
            if deadline != goal.deadline {
                changes.track("deadline", &goal.deadline, &deadline);
                goal.deadline = deadline;
                goal.validate_deadline(self.today())
                    .map_err(|e| FinanceError::Validation(e.to_string()))?;
            }
        }
        if let Some(milestones) = patch.milestones {
            changes.track(
                "milestones",
                &milestones_label(&goal.milestones),
                &milestones_label(&milestones),
            );
            goal.milestones = milestones;
        }

        goal.validate()
            .map_err(|e| FinanceError::Validation(e.to_string()))?;
        self.ensure_unique(&goal)?;

        let Some(record) = changes.into_record(self.clock.now()) else {
            return Ok(goal);
        };
        let summary = record.summary();
        goal.record_edit(record);

        self.persist_update(owner, &before, &goal, summary.clone())?;
        info!(goal = %goal.id, changes = %summary, "updated goal");
        Ok(goal)
    }

    /// Add to, subtract from or set the saved amount
    pub fn update_amount(
        &self,
        owner: &Owner,
        id: GoalId,
        operation: AmountOperation,
        amount: Money,
    ) -> FinanceResult<AmountUpdate> {
        if amount.is_negative() {
            return Err(FinanceError::Validation(format!(
                "Amount cannot be negative (got {})",
                amount
            )));
        }

        let mut goal = self.get(owner, id)?;
        let before = goal.clone();
        let reached = goal.apply_amount(operation, amount, self.clock.now());
        let completed_now = goal.is_completed && !before.is_completed;

        self.persist_update(
            owner,
            &before,
            &goal,
            format!(
                "current_amount: {} -> {} ({} {})",
                before.current_amount, goal.current_amount, operation, amount
            ),
        )?;

        info!(
            goal = %goal.id,
            operation = %operation,
            current = %goal.current_amount,
            milestones = reached.len(),
            completed = completed_now,
            "updated goal amount"
        );
        Ok(AmountUpdate {
            goal,
            reached,
            completed_now,
        })
    }

    /// Flip the completion flag
    pub fn toggle(&self, owner: &Owner, id: GoalId) -> FinanceResult<Goal> {
        let mut goal = self.get(owner, id)?;
        let before = goal.clone();
        goal.is_completed = !goal.is_completed;
        goal.updated_at = self.clock.now();

        self.persist_update(
            owner,
            &before,
            &goal,
            format!("is_completed: {} -> {}", before.is_completed, goal.is_completed),
        )?;

        info!(goal = %goal.id, completed = goal.is_completed, "toggled goal");
        Ok(goal)
    }

    pub fn delete(&self, owner: &Owner, id: GoalId) -> FinanceResult<Goal> {
        let goal = self.get(owner, id)?;

        self.storage.goals.delete(id)?;
        self.storage.goals.save()?;

        self.storage.log_delete(
            EntityType::Goal,
            id.to_string(),
            owner,
            Some(goal.name.clone()),
            &goal,
        )?;

        info!(goal = %id, "deleted goal");
        Ok(goal)
    }

    pub fn progress(&self, owner: &Owner, id: GoalId) -> FinanceResult<GoalProgress> {
        Ok(self.get(owner, id)?.progress(self.today()))
    }
}
